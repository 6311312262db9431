//! Task trait - 型付き Task の定義
//!
//! Task 型そのものが execute request の payload（`data`）になります。

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Task は task_type と payload 型を対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// #[serde(transparent)]
/// struct Scale(i64);
///
/// impl Task for Scale {
///     const TYPE: &'static str = "demo.scale.v1";
/// }
/// ```
///
/// # Trait Bounds
/// - `Serialize`: controller 側で `data` を組み立てるため
/// - `DeserializeOwned`: context 側で `data` から復元するため
/// - `Send + Sync + 'static`: context のスレッドへ渡すため
pub trait Task: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// task_type の定義
    ///
    /// # 命名規約
    /// - `{namespace}.{action}.v{major}`（空文字は不可）
    const TYPE: &'static str;
}
