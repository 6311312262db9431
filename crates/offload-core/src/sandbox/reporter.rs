//! Reporter - 実行中の task に渡される報告用オブジェクト
//!
//! terminal report（completed / error_report）は 1 回だけ送られ、
//! それ以降の呼び出しは warn ログを出して破棄されます。

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;

use crate::domain::errors::{ErrorKind, ErrorPayload, TaskError};
use crate::domain::ids::RequestId;
use crate::domain::message::Message;

/// Emits the reports of exactly one execution.
///
/// Cloneable so a task can hand it to work it spawns. Once a terminal report
/// (completion or error) has gone out, every later call is dropped.
#[derive(Clone)]
pub struct Reporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    request_id: RequestId,
    outbox: mpsc::UnboundedSender<Message>,
    // held while sending so progress can never overtake the terminal report
    finished: Mutex<bool>,
}

impl Reporter {
    pub(crate) fn new(request_id: RequestId, outbox: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            inner: Arc::new(ReporterInner {
                request_id,
                outbox,
                finished: Mutex::new(false),
            }),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.inner.request_id
    }

    /// Whether a terminal report has been emitted.
    pub fn is_finished(&self) -> bool {
        *self
            .inner
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn report_progress(&self, step: u64) {
        let finished = self
            .inner
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *finished {
            tracing::warn!(
                request_id = %self.inner.request_id,
                step,
                "progress after terminal report dropped"
            );
            return;
        }
        self.emit(Message::ProgressReport {
            request_id: self.inner.request_id,
            step,
        });
    }

    /// Emit the completion report. A result that cannot be serialized is
    /// reported as an `invalid_payload` error instead.
    pub fn completed<R: Serialize>(&self, result: R) {
        let message = match serde_json::to_value(&result) {
            Ok(result) => Message::CompletionReport {
                request_id: self.inner.request_id,
                result,
            },
            Err(e) => Message::ErrorReport {
                request_id: self.inner.request_id,
                error: ErrorPayload::new(
                    ErrorKind::InvalidPayload,
                    format!("result encode: {e}"),
                ),
            },
        };
        self.finish(message);
    }

    /// Emit an `execution` error report.
    pub fn error_report(&self, message: impl Into<String>) {
        self.fail(TaskError::Execution(message.into()));
    }

    pub fn fail(&self, error: TaskError) {
        self.finish(Message::ErrorReport {
            request_id: self.inner.request_id,
            error: error.to_payload(),
        });
    }

    fn finish(&self, message: Message) -> bool {
        let mut finished = self
            .inner
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *finished {
            tracing::warn!(
                request_id = %self.inner.request_id,
                kind = ?message.kind(),
                "second terminal report dropped"
            );
            return false;
        }
        *finished = true;
        self.emit(message);
        true
    }

    fn emit(&self, message: Message) {
        if self.inner.outbox.send(message).is_err() {
            tracing::debug!(
                request_id = %self.inner.request_id,
                "controller side is gone; report discarded"
            );
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("request_id", &self.inner.request_id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Argument of a running task: its payload plus the reporting surface.
#[derive(Debug)]
pub struct TaskArg<T> {
    pub data: T,
    reporter: Reporter,
}

impl<T> TaskArg<T> {
    pub fn new(data: T, reporter: Reporter) -> Self {
        Self { data, reporter }
    }

    pub fn report_progress(&self, step: u64) {
        self.reporter.report_progress(step);
    }

    pub fn completed<R: Serialize>(&self, result: R) {
        self.reporter.completed(result);
    }

    pub fn error_report(&self, message: impl Into<String>) {
        self.reporter.error_report(message);
    }

    pub fn request_id(&self) -> RequestId {
        self.reporter.request_id()
    }

    /// A handle that outlives this argument.
    pub fn reporter(&self) -> Reporter {
        self.reporter.clone()
    }

    pub fn into_parts(self) -> (T, Reporter) {
        (self.data, self.reporter)
    }
}
