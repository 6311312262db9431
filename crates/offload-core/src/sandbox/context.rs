//! ExecutionContext - 隔離された実行コンテキスト
//!
//! 専用の OS スレッド上に current-thread の Tokio runtime を立て、
//! inbox から届く message を 1 つずつ処理します。
//!
//! # フロー
//! 1. `ExecuteRequest`: registry から handler を引き、別タスクとして起動
//!    （handler が await で止まっても inbox は止まらない）
//! 2. `LoadLibraryRequest`: location を順番に解決・インストール
//!    （inbox ループ内で完了させるので、後続の実行からは必ず見える）
//! 3. 結果は outbox（controller 側）へ流れる

use std::any::Any;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::thread;

use serde_json::Value;
use tokio::sync::mpsc;

use super::reporter::Reporter;
use super::state::{ContextState, LoadedLibrary};
use crate::domain::errors::TaskError;
use crate::domain::ids::RequestId;
use crate::domain::message::{Direction, Message};
use crate::ports::LibraryResolver;
use crate::typed::DynHandler;

/// Controller-side handle to the context thread.
pub struct ExecutionContext {
    inbox: mpsc::UnboundedSender<Message>,
    state: Arc<ContextState>,
    thread: thread::JoinHandle<()>,
}

impl ExecutionContext {
    /// Start the context thread. Returns the context and the receiving end
    /// of its outbound channel.
    pub fn spawn(
        thread_name: &str,
        state: Arc<ContextState>,
        resolver: Arc<dyn LibraryResolver>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Message>), TaskError> {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (init_tx, init_rx) = std_mpsc::channel::<Result<(), String>>();

        let sandbox = Sandbox {
            state: Arc::clone(&state),
            resolver,
            outbox: outbox_tx,
        };

        let thread = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => {
                        let _ = init_tx.send(Ok(()));
                        runtime
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                runtime.block_on(sandbox.run(inbox_rx));
            })
            .map_err(|e| TaskError::Channel(format!("failed to spawn execution context: {e}")))?;

        match init_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(TaskError::Channel(format!(
                    "failed to start execution context runtime: {e}"
                )));
            }
            Err(_) => {
                return Err(TaskError::Channel(
                    "execution context exited during startup".to_string(),
                ));
            }
        }

        tracing::info!(thread = thread_name, "execution context started");

        Ok((
            Self {
                inbox: inbox_tx,
                state,
                thread,
            },
            outbox_rx,
        ))
    }

    /// Post a message to the context. Never waits for a response.
    pub fn post(&self, message: Message) -> Result<(), TaskError> {
        self.inbox
            .send(message)
            .map_err(|_| TaskError::Channel("execution context is not running".to_string()))
    }

    pub fn loaded_libraries(&self) -> Vec<LoadedLibrary> {
        self.state.loaded_libraries()
    }

    pub fn is_running(&self) -> bool {
        !self.inbox.is_closed() && !self.thread.is_finished()
    }

    /// Close the inbox and wait for the context thread to exit. Executions
    /// still pending are dropped without a terminal report.
    pub fn shutdown(self) -> Result<(), TaskError> {
        let ExecutionContext { inbox, thread, .. } = self;
        drop(inbox);
        thread
            .join()
            .map_err(|_| TaskError::Channel("execution context panicked".to_string()))
    }
}

struct Sandbox {
    state: Arc<ContextState>,
    resolver: Arc<dyn LibraryResolver>,
    outbox: mpsc::UnboundedSender<Message>,
}

impl Sandbox {
    async fn run(self, mut inbox: mpsc::UnboundedReceiver<Message>) {
        while let Some(message) = inbox.recv().await {
            match message {
                Message::ExecuteRequest {
                    request_id,
                    task_type,
                    data,
                } => self.execute(request_id, task_type, data),
                Message::LoadLibraryRequest { request_id, urls } => {
                    self.load_libraries(request_id, urls).await
                }
                other => {
                    debug_assert_eq!(other.direction(), Direction::ToController);
                    tracing::warn!(
                        request_id = %other.request_id(),
                        kind = ?other.kind(),
                        "ignoring report message sent to the execution context"
                    );
                }
            }
        }
        tracing::debug!("inbox closed; execution context stopping");
    }

    fn execute(&self, request_id: RequestId, task_type: String, data: Value) {
        let reporter = Reporter::new(request_id, self.outbox.clone());
        let Some(handler) = self.state.handler(&task_type) else {
            tracing::debug!(%request_id, %task_type, "no handler registered");
            reporter.fail(TaskError::HandlerNotFound(task_type));
            return;
        };
        tracing::debug!(%request_id, %task_type, "executing");
        tokio::spawn(supervise(handler, data, reporter));
    }

    async fn load_libraries(&self, request_id: RequestId, urls: Vec<String>) {
        let reporter = Reporter::new(request_id, self.outbox.clone());
        let mut names = Vec::with_capacity(urls.len());

        for location in urls {
            match self.resolver.resolve(&location).await {
                Ok(library) => {
                    let loaded = self.state.install(&location, library.as_ref());
                    tracing::info!(%request_id, %location, name = %loaded.name, "library loaded");
                    names.push(loaded.name);
                }
                Err(err) => {
                    let err = match err {
                        err @ TaskError::LibraryLoad { .. } => err,
                        other => TaskError::LibraryLoad {
                            location: location.clone(),
                            reason: other.to_string(),
                        },
                    };
                    tracing::warn!(%request_id, %location, error = %err, "library load failed");
                    reporter.fail(err);
                    return;
                }
            }
        }

        reporter.completed(names);
    }
}

/// Run one handler and turn an `Err` or a panic into the error report.
async fn supervise(handler: Arc<dyn DynHandler>, data: Value, reporter: Reporter) {
    let task = tokio::spawn({
        let reporter = reporter.clone();
        async move { handler.handle_dyn(data, reporter).await }
    });

    match task.await {
        Ok(Ok(())) => {
            if !reporter.is_finished() {
                tracing::trace!(
                    request_id = %reporter.request_id(),
                    "handler returned without a terminal report; execution stays open"
                );
            }
        }
        Ok(Err(err)) => reporter.fail(err),
        Err(join_err) if join_err.is_panic() => {
            let message = panic_message(join_err.into_panic());
            reporter.fail(TaskError::Execution(format!("task panicked: {message}")));
        }
        Err(_) => {
            tracing::debug!(request_id = %reporter.request_id(), "execution cancelled");
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
