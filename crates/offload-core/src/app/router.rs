//! Router - outbox の message を request ごとに振り分ける
//!
//! # フロー
//! 1. dispatch 前に `RequestId -> Route` を登録
//! 2. router スレッドが outbox を読み、request_id で Route を引く
//! 3. terminal report で Route を削除
//! 4. context が終了したら、残った Route 全てに channel error を通知

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::callbacks::CallbackSlot;
use crate::domain::errors::TaskError;
use crate::domain::ids::{HandleId, RequestId};
use crate::domain::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    Execute,
    LoadLibrary,
}

#[derive(Clone)]
pub(crate) struct Route {
    pub(crate) handle: HandleId,
    pub(crate) kind: RequestKind,
    pub(crate) callbacks: Arc<CallbackSlot>,
}

pub(crate) type Routes = Arc<Mutex<HashMap<RequestId, Route>>>;

pub(crate) fn lock(routes: &Routes) -> MutexGuard<'_, HashMap<RequestId, Route>> {
    routes.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drain the outbox until the context goes away. Blocks the calling thread.
pub(crate) fn run(mut outbox: mpsc::UnboundedReceiver<Message>, routes: Routes) {
    while let Some(message) = outbox.blocking_recv() {
        deliver(&routes, message);
    }

    let orphaned: Vec<(RequestId, Route)> = lock(&routes).drain().collect();
    for (request_id, route) in orphaned {
        tracing::warn!(%request_id, handle = %route.handle, "execution context terminated before terminal report");
        route
            .callbacks
            .error(TaskError::Channel("execution context terminated".to_string()));
    }
    tracing::debug!("router stopped");
}

pub(crate) fn deliver(routes: &Routes, message: Message) {
    let request_id = message.request_id();
    match message {
        Message::ProgressReport { step, .. } => {
            let route = lock(routes).get(&request_id).cloned();
            match route {
                Some(route) => route.callbacks.progress(step),
                None => tracing::warn!(%request_id, step, "progress for unknown request"),
            }
        }
        Message::CompletionReport { result, .. } => {
            let route = lock(routes).remove(&request_id);
            match route {
                Some(Route {
                    kind: RequestKind::Execute,
                    callbacks,
                    ..
                }) => callbacks.complete(result),
                Some(Route {
                    kind: RequestKind::LoadLibrary,
                    handle,
                    ..
                }) => tracing::debug!(%request_id, %handle, libraries = %result, "library load finished"),
                None => tracing::warn!(%request_id, "completion for unknown request"),
            }
        }
        Message::ErrorReport { error, .. } => {
            let route = lock(routes).remove(&request_id);
            match route {
                Some(route) => route.callbacks.error(TaskError::from(error)),
                None => tracing::warn!(%request_id, kind = ?error.kind, "error for unknown request"),
            }
        }
        other => tracing::warn!(
            %request_id,
            kind = ?other.kind(),
            "ignoring context-bound message on the outbound channel"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ErrorKind, ErrorPayload};
    use serde_json::{Value, json};
    use ulid::Ulid;

    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
        slot: Arc<CallbackSlot>,
    }

    fn recorder() -> Recorder {
        let events = Arc::new(Mutex::new(Vec::new()));
        let slot = Arc::new(CallbackSlot::default());
        let (p, c, e) = (events.clone(), events.clone(), events.clone());
        slot.update(|cbs| {
            cbs.on_progress_changed = Some(Arc::new(move |s| p.lock().unwrap().push(format!("progress:{s}"))));
            cbs.on_complete = Some(Arc::new(move |v| c.lock().unwrap().push(format!("complete:{v}"))));
            cbs.on_error = Some(Arc::new(move |err| e.lock().unwrap().push(format!("error:{:?}", err.kind()))));
        });
        Recorder { events, slot }
    }

    fn route(rec: &Recorder, kind: RequestKind) -> Route {
        Route {
            handle: HandleId::from_ulid(Ulid::new()),
            kind,
            callbacks: Arc::clone(&rec.slot),
        }
    }

    fn rid() -> RequestId {
        RequestId::from_ulid(Ulid::new())
    }

    #[test]
    fn terminal_report_removes_the_route() {
        let routes: Routes = Default::default();
        let rec = recorder();
        let id = rid();
        lock(&routes).insert(id, route(&rec, RequestKind::Execute));

        deliver(&routes, Message::ProgressReport { request_id: id, step: 1 });
        deliver(&routes, Message::CompletionReport { request_id: id, result: json!(5) });
        // a late duplicate is not delivered
        deliver(&routes, Message::CompletionReport { request_id: id, result: json!(6) });

        assert_eq!(*rec.events.lock().unwrap(), vec!["progress:1", "complete:5"]);
        assert!(lock(&routes).is_empty());
    }

    #[test]
    fn reports_go_to_the_originating_route() {
        let routes: Routes = Default::default();
        let (x, y) = (recorder(), recorder());
        let (xid, yid) = (rid(), rid());
        lock(&routes).insert(xid, route(&x, RequestKind::Execute));
        lock(&routes).insert(yid, route(&y, RequestKind::Execute));

        deliver(&routes, Message::CompletionReport { request_id: yid, result: json!("y") });
        deliver(&routes, Message::CompletionReport { request_id: xid, result: json!("x") });

        assert_eq!(*x.events.lock().unwrap(), vec![r#"complete:"x""#]);
        assert_eq!(*y.events.lock().unwrap(), vec![r#"complete:"y""#]);
    }

    #[test]
    fn library_completion_is_not_forwarded_but_errors_are() {
        let routes: Routes = Default::default();
        let rec = recorder();
        let (ok_id, bad_id) = (rid(), rid());
        lock(&routes).insert(ok_id, route(&rec, RequestKind::LoadLibrary));
        lock(&routes).insert(bad_id, route(&rec, RequestKind::LoadLibrary));

        deliver(&routes, Message::CompletionReport { request_id: ok_id, result: json!(["math"]) });
        deliver(
            &routes,
            Message::ErrorReport {
                request_id: bad_id,
                error: ErrorPayload::new(ErrorKind::LibraryLoad, "nope").with_location("mem://x"),
            },
        );

        assert_eq!(*rec.events.lock().unwrap(), vec!["error:LibraryLoad"]);
    }

    #[test]
    fn closed_outbox_fails_pending_routes() {
        let routes: Routes = Default::default();
        let rec = recorder();
        lock(&routes).insert(rid(), route(&rec, RequestKind::Execute));

        let (tx, rx) = mpsc::unbounded_channel::<Message>();
        drop(tx);
        run(rx, Arc::clone(&routes));

        assert_eq!(*rec.events.lock().unwrap(), vec!["error:Channel"]);
        assert!(lock(&routes).is_empty());
    }

    #[test]
    fn unknown_requests_are_dropped() {
        let routes: Routes = Default::default();
        deliver(&routes, Message::CompletionReport { request_id: rid(), result: Value::Null });
        deliver(
            &routes,
            Message::ExecuteRequest {
                request_id: rid(),
                task_type: "x".into(),
                data: Value::Null,
            },
        );
        assert!(lock(&routes).is_empty());
    }
}
