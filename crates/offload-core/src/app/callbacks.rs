//! Callbacks - TaskHandle のイベントコールバック
//!
//! `on_progress_changed` / `on_complete` / `on_error` はいつでも差し替え可能。
//! 未設定の slot に届いたイベントは破棄されます。

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::domain::errors::TaskError;
use crate::sandbox::context::panic_message;

pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;
pub type CompleteCallback = Arc<dyn Fn(Value) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(TaskError) + Send + Sync>;

/// The three assignable event slots. An unset slot drops its events.
#[derive(Default, Clone)]
pub struct Callbacks {
    pub on_progress_changed: Option<ProgressCallback>,
    pub on_complete: Option<CompleteCallback>,
    pub on_error: Option<ErrorCallback>,
}

/// Shared between a handle and the routes of its in-flight requests, so a
/// reassignment is seen by reports that arrive afterwards.
#[derive(Default)]
pub(crate) struct CallbackSlot {
    callbacks: RwLock<Callbacks>,
}

impl CallbackSlot {
    pub(crate) fn update(&self, f: impl FnOnce(&mut Callbacks)) {
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut callbacks);
    }

    fn snapshot(&self) -> Callbacks {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // Callbacks run outside the lock so they may reassign callbacks themselves.

    pub(crate) fn progress(&self, step: u64) {
        match self.snapshot().on_progress_changed {
            Some(cb) => contain("on_progress_changed", || cb(step)),
            None => tracing::trace!(step, "no on_progress_changed; event dropped"),
        }
    }

    pub(crate) fn complete(&self, result: Value) {
        match self.snapshot().on_complete {
            Some(cb) => contain("on_complete", || cb(result)),
            None => tracing::trace!("no on_complete; event dropped"),
        }
    }

    pub(crate) fn error(&self, error: TaskError) {
        match self.snapshot().on_error {
            Some(cb) => contain("on_error", || cb(error)),
            None => tracing::trace!(%error, "no on_error; event dropped"),
        }
    }
}

/// A panicking callback must not take the router thread down with it.
fn contain(slot: &'static str, f: impl FnOnce()) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let reason = panic_message(panic);
        tracing::error!(slot, %reason, "callback panicked; event dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn unset_slots_drop_events() {
        let slot = CallbackSlot::default();
        slot.progress(1);
        slot.complete(Value::Null);
        slot.error(TaskError::execution("x"));
    }

    #[test]
    fn callback_may_reassign_itself() {
        let slot = Arc::new(CallbackSlot::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let slot_in_cb = Arc::clone(&slot);
        let seen_in_cb = Arc::clone(&seen);
        slot.update(move |cbs| {
            cbs.on_progress_changed = Some(Arc::new(move |step| {
                seen_in_cb.lock().unwrap().push(step);
                slot_in_cb.update(|cbs| cbs.on_progress_changed = None);
            }));
        });

        slot.progress(1);
        slot.progress(2);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn panicking_callback_is_contained() {
        let slot = CallbackSlot::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_cb = Arc::clone(&seen);
        slot.update(|cbs| {
            cbs.on_complete = Some(Arc::new(|_: Value| panic!("boom")));
            cbs.on_error = Some(Arc::new(move |err| seen_in_cb.lock().unwrap().push(err.kind())));
        });

        slot.complete(Value::Null);
        slot.error(TaskError::execution("after"));

        assert_eq!(*seen.lock().unwrap(), vec![crate::domain::errors::ErrorKind::Execution]);
    }
}
