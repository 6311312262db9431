//! Errors - エラー型と分類
//!
//! `TaskError` は controller 側で扱う型、`ErrorPayload` は
//! execution context から channel を越えて運ばれる表現です。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ErrorKind はエラーの分類（wire 上の `kind`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    Execution,
    HandlerNotFound,
    InvalidPayload,
    LibraryLoad,
    Channel,
}

/// Error as it travels inside an `ErrorReport`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,

    /// Library location for `library_load` errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ErrorPayload {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Rejected synchronously by the caller-facing API.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The task implementation failed (returned an error or panicked).
    #[error("execution failed: {0}")]
    Execution(String),

    #[error("no handler registered for task_type={0}")]
    HandlerNotFound(String),

    #[error("payload does not match task: {0}")]
    InvalidPayload(String),

    #[error("failed to load library '{location}': {reason}")]
    LibraryLoad { location: String, reason: String },

    /// The channel to the execution context is gone.
    #[error("channel error: {0}")]
    Channel(String),
}

impl TaskError {
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            TaskError::Execution(_) => ErrorKind::Execution,
            TaskError::HandlerNotFound(_) => ErrorKind::HandlerNotFound,
            TaskError::InvalidPayload(_) => ErrorKind::InvalidPayload,
            TaskError::LibraryLoad { .. } => ErrorKind::LibraryLoad,
            TaskError::Channel(_) => ErrorKind::Channel,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            TaskError::InvalidArgument(m)
            | TaskError::Execution(m)
            | TaskError::HandlerNotFound(m)
            | TaskError::InvalidPayload(m)
            | TaskError::Channel(m) => ErrorPayload::new(self.kind(), m.clone()),
            TaskError::LibraryLoad { location, reason } => {
                ErrorPayload::new(ErrorKind::LibraryLoad, reason.clone()).with_location(location.clone())
            }
        }
    }
}

impl From<ErrorPayload> for TaskError {
    fn from(payload: ErrorPayload) -> Self {
        let ErrorPayload {
            kind,
            message,
            location,
        } = payload;
        match kind {
            ErrorKind::InvalidArgument => TaskError::InvalidArgument(message),
            ErrorKind::Execution => TaskError::Execution(message),
            ErrorKind::HandlerNotFound => TaskError::HandlerNotFound(message),
            ErrorKind::InvalidPayload => TaskError::InvalidPayload(message),
            ErrorKind::LibraryLoad => TaskError::LibraryLoad {
                location: location.unwrap_or_default(),
                reason: message,
            },
            ErrorKind::Channel => TaskError::Channel(message),
        }
    }
}

impl From<&TaskError> for ErrorPayload {
    fn from(err: &TaskError) -> Self {
        err.to_payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskError::InvalidArgument("empty".into()))]
    #[case(TaskError::execution("boom"))]
    #[case(TaskError::HandlerNotFound("demo.missing.v1".into()))]
    #[case(TaskError::InvalidPayload("expected i64".into()))]
    #[case(TaskError::LibraryLoad { location: "mem://math".into(), reason: "not found".into() })]
    #[case(TaskError::Channel("closed".into()))]
    fn error_survives_the_wire(#[case] err: TaskError) {
        let json = serde_json::to_string(&err.to_payload()).unwrap();
        let payload: ErrorPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(TaskError::from(payload), err);
    }

    #[test]
    fn library_load_payload_carries_location() {
        let err = TaskError::LibraryLoad {
            location: "mem://math".into(),
            reason: "not found".into(),
        };
        let v = serde_json::to_value(err.to_payload()).unwrap();
        assert_eq!(v["kind"], "library_load");
        assert_eq!(v["location"], "mem://math");
        assert_eq!(v["message"], "not found");
    }

    #[test]
    fn location_is_omitted_for_other_kinds() {
        let v = serde_json::to_value(TaskError::execution("x").to_payload()).unwrap();
        assert!(v.get("location").is_none());
    }
}
