//! Library port - 外部ライブラリの解決
//!
//! `LoadLibraryRequest` の各 location は `LibraryResolver` で `Library` に
//! 解決され、execution context の registry にインストールされます。
//! 一度入ったライブラリは context が生きている間ずっと見えます。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::TaskError;
use crate::typed::TypedRegistry;

/// A named set of task implementations that can be installed at runtime.
pub trait Library: Send + Sync {
    fn name(&self) -> &str;

    /// Install this library's handlers. Existing registrations for the same
    /// task type are replaced.
    fn install(&self, registry: &mut TypedRegistry);
}

/// LibraryResolver は location 文字列から Library を取得
///
/// 失敗は `TaskError::LibraryLoad` で返してください。
#[async_trait]
pub trait LibraryResolver: Send + Sync {
    async fn resolve(&self, location: &str) -> Result<Arc<dyn Library>, TaskError>;
}
