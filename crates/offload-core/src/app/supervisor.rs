//! Supervisor - execution context の所有者
//!
//! # 役割
//! - context を最初のアクセス時に 1 度だけ起動する（lazy, mutex で check-and-set）
//! - dispatch ごとに RequestId を払い出し、Route を登録してから message を送る
//! - router スレッドが report を request_id で元の TaskHandle に届ける
//!
//! 複数の TaskHandle が同時に実行しても、report が取り違えられることはありません。

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use super::config::ContextConfig;
use super::router::{self, Route, Routes};
use crate::domain::errors::TaskError;
use crate::domain::ids::{HandleId, RequestId};
use crate::domain::message::Message;
use crate::ports::{IdGenerator, LibraryResolver};
use crate::sandbox::{ContextState, ExecutionContext, LoadedLibrary};

pub struct Supervisor {
    config: ContextConfig,
    state: Arc<ContextState>,
    resolver: Arc<dyn LibraryResolver>,
    ids: Box<dyn IdGenerator>,
    routes: Routes,
    context: Mutex<Option<Running>>,
}

struct Running {
    context: ExecutionContext,
    router: JoinHandle<()>,
}

impl Running {
    fn is_alive(&self) -> bool {
        self.context.is_running() && !self.router.is_finished()
    }
}

impl Supervisor {
    pub(crate) fn new(
        config: ContextConfig,
        state: ContextState,
        resolver: Arc<dyn LibraryResolver>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            config,
            state: Arc::new(state),
            resolver,
            ids,
            routes: Routes::default(),
            context: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Whether the execution context has been created.
    pub fn is_started(&self) -> bool {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Libraries loaded into the context so far, in load order.
    pub fn loaded_libraries(&self) -> Vec<LoadedLibrary> {
        self.state.loaded_libraries()
    }

    /// Task types the context can currently execute.
    pub fn registered_types(&self) -> Vec<String> {
        self.state.registered_types()
    }

    /// Requests dispatched whose terminal report has not been delivered yet.
    pub fn pending_requests(&self) -> usize {
        router::lock(&self.routes).len()
    }

    pub(crate) fn next_handle_id(&self) -> HandleId {
        self.ids.generate_handle_id()
    }

    /// Register `route` under a fresh request id, then post the message built
    /// for that id.
    pub(crate) fn dispatch(
        &self,
        route: Route,
        build: impl FnOnce(RequestId) -> Message,
    ) -> Result<RequestId, TaskError> {
        let mut context = self.context.lock().unwrap_or_else(PoisonError::into_inner);
        if context.is_none() {
            *context = Some(self.start()?);
        }
        let Some(running) = context.as_ref() else {
            return Err(TaskError::Channel("execution context unavailable".to_string()));
        };
        if !running.is_alive() {
            return Err(TaskError::Channel("execution context is not running".to_string()));
        }

        let request_id = self.ids.generate_request_id();
        let message = build(request_id);
        tracing::debug!(
            %request_id,
            handle = %route.handle,
            kind = ?message.kind(),
            "dispatching"
        );

        router::lock(&self.routes).insert(request_id, route);
        if let Err(err) = running.context.post(message) {
            router::lock(&self.routes).remove(&request_id);
            return Err(err);
        }
        Ok(request_id)
    }

    fn start(&self) -> Result<Running, TaskError> {
        let (context, outbox) = ExecutionContext::spawn(
            &self.config.context_thread_name,
            Arc::clone(&self.state),
            Arc::clone(&self.resolver),
        )?;

        let routes = Arc::clone(&self.routes);
        let router = thread::Builder::new()
            .name(self.config.router_thread_name.clone())
            .spawn(move || router::run(outbox, routes))
            .map_err(|e| TaskError::Channel(format!("failed to spawn router: {e}")))?;

        Ok(Running { context, router })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::callbacks::CallbackSlot;
    use crate::app::router::RequestKind;
    use crate::impls::StaticLibraryResolver;
    use crate::ports::{SystemClock, UlidGenerator};
    use crate::typed::TypedRegistry;
    use serde_json::Value;

    fn supervisor() -> Arc<Supervisor> {
        Arc::new(Supervisor::new(
            ContextConfig::default(),
            ContextState::new(TypedRegistry::new()),
            Arc::new(StaticLibraryResolver::new()),
            Box::new(UlidGenerator::new(SystemClock)),
        ))
    }

    fn route(sup: &Supervisor) -> Route {
        Route {
            handle: sup.next_handle_id(),
            kind: RequestKind::Execute,
            callbacks: Arc::new(CallbackSlot::default()),
        }
    }

    #[test]
    fn context_is_created_lazily() {
        let sup = supervisor();
        assert!(!sup.is_started());
        assert_eq!(sup.pending_requests(), 0);

        sup.dispatch(route(&sup), |request_id| Message::ExecuteRequest {
            request_id,
            task_type: "missing.v1".into(),
            data: Value::Null,
        })
        .unwrap();

        assert!(sup.is_started());
    }

    #[test]
    fn concurrent_first_access_creates_one_context() {
        let sup = supervisor();

        let ids: Vec<RequestId> = thread::scope(|s| {
            let joins: Vec<_> = (0..8)
                .map(|_| {
                    let sup = Arc::clone(&sup);
                    s.spawn(move || {
                        sup.dispatch(route(&sup), |request_id| Message::LoadLibraryRequest {
                            request_id,
                            urls: Vec::new(),
                        })
                        .unwrap()
                    })
                })
                .collect();
            joins.into_iter().map(|j| j.join().unwrap()).collect()
        });

        assert_eq!(ids.len(), 8);
        assert!(sup.is_started());
        // a second context would have its own thread; there is only one slot
        assert!(sup.context.lock().unwrap().as_ref().unwrap().is_alive());
    }

    #[test]
    fn dispatch_fails_once_the_router_is_gone() {
        let sup = supervisor();
        let (context, _outbox) = ExecutionContext::spawn(
            "offload-context-test",
            Arc::clone(&sup.state),
            Arc::clone(&sup.resolver),
        )
        .unwrap();
        let router = thread::spawn(|| {});
        while !router.is_finished() {
            thread::yield_now();
        }
        *sup.context.lock().unwrap() = Some(Running { context, router });

        let err = sup
            .dispatch(route(&sup), |request_id| Message::ExecuteRequest {
                request_id,
                task_type: "missing.v1".into(),
                data: Value::Null,
            })
            .unwrap_err();

        assert!(matches!(err, TaskError::Channel(_)));
        assert_eq!(sup.pending_requests(), 0);
    }
}
