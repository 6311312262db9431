//! HandlerBundle - 名前付きの Handler 集合（Library 実装）

use std::future::Future;
use std::sync::Arc;

use crate::domain::errors::TaskError;
use crate::ports::Library;
use crate::sandbox::TaskArg;
use crate::typed::{DynHandler, Handler, Task, TypedHandler, TypedRegistry, handler_fn};

/// A library made of statically compiled handlers.
///
/// ```ignore
/// let text = HandlerBundle::new("text")
///     .with_task::<Upper, _>(UpperHandler)
///     .with_fn(|arg: TaskArg<Lower>| async move { ... });
/// ```
#[derive(Clone)]
pub struct HandlerBundle {
    name: String,
    handlers: Vec<Arc<dyn DynHandler>>,
}

impl HandlerBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    pub fn with_task<T: Task, H: Handler<T> + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(TypedHandler::new(handler)));
        self
    }

    pub fn with_fn<T, F, Fut>(self, f: F) -> Self
    where
        T: Task,
        F: Fn(TaskArg<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.with_task::<T, _>(handler_fn(f))
    }

    pub fn task_types(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.task_type()).collect()
    }
}

impl Library for HandlerBundle {
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self, registry: &mut TypedRegistry) {
        for handler in &self.handlers {
            if registry.insert_dyn(Arc::clone(handler)).is_some() {
                tracing::debug!(
                    library = %self.name,
                    task_type = handler.task_type(),
                    "replaced existing handler"
                );
            }
        }
    }
}
