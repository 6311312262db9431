//! offload-core
//!
//! 1 つの隔離された execution context にタスクを投げ、進捗・完了・エラーを
//! 非同期の message で受け取るための building blocks。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, message, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, LibraryResolver）
//! - **typed**: 型付き Task API（Task trait, Handler trait, TypedRegistry, PayloadCodec）
//! - **sandbox**: context 側（ExecutionContext, Reporter, TaskArg）
//! - **app**: controller 側（SupervisorBuilder, Supervisor, TaskHandle）
//! - **impls**: 実装（StaticLibraryResolver, HandlerBundle）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod sandbox;
pub mod typed;

pub use crate::app::{ContextConfig, Supervisor, SupervisorBuilder, TaskHandle};
pub use crate::domain::{Message, RequestId, TaskError};
pub use crate::sandbox::TaskArg;
pub use crate::typed::{Handler, Task};
