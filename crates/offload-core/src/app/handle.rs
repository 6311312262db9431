//! TaskHandle - 1 つの task 定義を表す caller 向けハンドル
//!
//! ```ignore
//! let task = TaskHandle::for_task::<Scale>(&supervisor)?;
//! task.set_on_complete(|r| println!("result: {r}")); // 1159000
//! task.run(1159)?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::callbacks::{CallbackSlot, Callbacks};
use super::router::{RequestKind, Route};
use super::supervisor::Supervisor;
use crate::domain::errors::TaskError;
use crate::domain::ids::{HandleId, RequestId};
use crate::domain::message::Message;
use crate::typed::Task;

/// Names a registered task and carries the callbacks for its events.
///
/// Handles are cheap; many may share one supervisor. Every `run` gets its
/// own request id and its reports come back to this handle only.
pub struct TaskHandle {
    id: HandleId,
    task_type: String,
    supervisor: Arc<Supervisor>,
    callbacks: Arc<CallbackSlot>,
}

impl TaskHandle {
    /// Fails with `InvalidArgument` on an empty task type. Does not touch the
    /// execution context and does not check the registry.
    pub fn new(supervisor: &Arc<Supervisor>, task_type: impl Into<String>) -> Result<Self, TaskError> {
        let task_type = task_type.into();
        if task_type.trim().is_empty() {
            return Err(TaskError::InvalidArgument(
                "a task handle needs a non-empty task type".to_string(),
            ));
        }
        Ok(Self {
            id: supervisor.next_handle_id(),
            task_type,
            supervisor: Arc::clone(supervisor),
            callbacks: Arc::new(CallbackSlot::default()),
        })
    }

    pub fn for_task<T: Task>(supervisor: &Arc<Supervisor>) -> Result<Self, TaskError> {
        Self::new(supervisor, T::TYPE)
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Post an execute request with `data` and return without waiting.
    pub fn run<D: Serialize>(&self, data: D) -> Result<RequestId, TaskError> {
        let data = serde_json::to_value(data)
            .map_err(|e| TaskError::InvalidArgument(format!("run data is not serializable: {e}")))?;
        let task_type = self.task_type.clone();
        self.supervisor
            .dispatch(self.route(RequestKind::Execute), move |request_id| {
                Message::ExecuteRequest {
                    request_id,
                    task_type,
                    data,
                }
            })
    }

    /// Post a library load for `urls`, in order. An empty list is a no-op
    /// and returns `Ok(None)`.
    pub fn load_library<I, S>(&self, urls: I) -> Result<Option<RequestId>, TaskError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.is_empty() {
            return Ok(None);
        }
        self.supervisor
            .dispatch(self.route(RequestKind::LoadLibrary), move |request_id| {
                Message::LoadLibraryRequest { request_id, urls }
            })
            .map(Some)
    }

    pub fn set_on_progress_changed(&self, f: impl Fn(u64) + Send + Sync + 'static) {
        self.callbacks
            .update(|cbs| cbs.on_progress_changed = Some(Arc::new(f)));
    }

    pub fn set_on_complete(&self, f: impl Fn(Value) + Send + Sync + 'static) {
        self.callbacks.update(|cbs| cbs.on_complete = Some(Arc::new(f)));
    }

    pub fn set_on_error(&self, f: impl Fn(TaskError) + Send + Sync + 'static) {
        self.callbacks.update(|cbs| cbs.on_error = Some(Arc::new(f)));
    }

    /// Replace all three callbacks at once.
    pub fn set_callbacks(&self, callbacks: Callbacks) {
        self.callbacks.update(|cbs| *cbs = callbacks);
    }

    pub fn clear_callbacks(&self) {
        self.set_callbacks(Callbacks::default());
    }

    fn route(&self, kind: RequestKind) -> Route {
        Route {
            handle: self.id,
            kind,
            callbacks: Arc::clone(&self.callbacks),
        }
    }
}
