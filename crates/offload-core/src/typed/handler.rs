//! Handler trait - Task を実行する Handler の定義
//!
//! # 二層構造
//! - `Handler<T>`: 型付き。`TaskArg<T>` を受け取る
//! - `DynHandler`: object-safe。JSON payload と `Reporter` を受け取る
//!
//! `TypedHandler<T, H>` が前者を後者に変換します（type erasure）。

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;

use super::codec::PayloadCodec;
use super::task::Task;
use crate::domain::errors::TaskError;
use crate::sandbox::{Reporter, TaskArg};

/// Handler は execution context の中で Task を実行する
///
/// 終了は `arg.completed(..)` / `arg.error_report(..)` で通知します。
/// `Err` を返した場合や panic した場合は context 側で error report に変換されます。
/// どちらも呼ばずに `Ok(())` を返すと、その実行は開いたままになります
/// （`arg.reporter()` を別タスクへ渡して後から完了させる場合など）。
///
/// # 使用例
/// ```ignore
/// struct ScaleHandler;
///
/// #[async_trait]
/// impl Handler<Scale> for ScaleHandler {
///     async fn handle(&self, arg: TaskArg<Scale>) -> Result<(), TaskError> {
///         arg.completed(arg.data.0 * 1000);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, arg: TaskArg<T>) -> Result<(), TaskError>;
}

/// DynHandler は object-safe な Handler の抽象化
///
/// HashMap<String, Arc<dyn DynHandler>> に格納するために使います。
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, payload: Value, reporter: Reporter) -> Result<(), TaskError>;
    fn task_type(&self) -> &str;
}

pub struct TypedHandler<T: Task, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<fn(T)>,
}

impl<T: Task, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Task, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    async fn handle_dyn(&self, payload: Value, reporter: Reporter) -> Result<(), TaskError> {
        let data: T = PayloadCodec::decode(payload)?;
        self.handler.handle(TaskArg::new(data, reporter)).await
    }

    fn task_type(&self) -> &str {
        T::TYPE
    }
}

/// Adapts an async closure into a `Handler`.
///
/// ```ignore
/// registry.register::<Scale, _>(handler_fn(|arg: TaskArg<Scale>| async move {
///     arg.completed(arg.data.0 * 1000);
///     Ok(())
/// }))?;
/// ```
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler { f }
}

#[async_trait]
impl<T, F, Fut> Handler<T> for FnHandler<F>
where
    T: Task,
    F: Fn(TaskArg<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), TaskError>> + Send,
{
    async fn handle(&self, arg: TaskArg<T>) -> Result<(), TaskError> {
        (self.f)(arg).await
    }
}
