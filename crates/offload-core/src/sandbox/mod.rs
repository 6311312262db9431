//! Sandbox - context 側のロジック
//!
//! - **ExecutionContext**: 専用スレッドと inbox/outbox
//! - **Reporter / TaskArg**: 実行中のタスクに渡す報告用の capability
//! - **ContextState**: registry とロード済みライブラリ

pub mod context;
pub mod reporter;
pub mod state;

pub use self::context::ExecutionContext;
pub use self::reporter::{Reporter, TaskArg};
pub use self::state::{ContextState, LoadedLibrary};
