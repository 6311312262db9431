//! Typed - 型付き Task API
//!
//! 実行する「関数」はソース文字列ではなく、登録済みの Handler を
//! task_type で引く形で execution context に渡します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Task` trait, `Handler<T>` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, type erasure

pub mod codec;
pub mod handler;
pub mod registry;
pub mod task;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::codec::{CodecError, PayloadCodec};
pub use self::handler::{DynHandler, FnHandler, Handler, TypedHandler, handler_fn};
pub use self::registry::{RegistryError, TypedRegistry};
pub use self::task::Task;
