//! App - アプリケーション層
//!
//! sandbox と ports を組み合わせ、caller 向けの API を提供します。
//!
//! # 主要コンポーネント
//! - **SupervisorBuilder**: 構築とワイヤリング、起動時検証
//! - **Supervisor**: execution context の所有と report の振り分け
//! - **TaskHandle**: `run` / `load_library` と 3 つのイベント callback
//! - **ContextConfig**: スレッド名などの設定

pub mod builder;
pub mod callbacks;
pub mod config;
pub mod handle;
mod router;
pub mod supervisor;

pub use self::builder::{BuildError, SupervisorBuilder};
pub use self::callbacks::{Callbacks, CompleteCallback, ErrorCallback, ProgressCallback};
pub use self::config::ContextConfig;
pub use self::handle::TaskHandle;
pub use self::supervisor::Supervisor;
