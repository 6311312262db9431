//! Message - controller と execution context の間のプロトコル
//!
//! 全ての message は所属する request の `RequestId` を持ちます。
//! controller は report を request ごとに振り分けます。
//!
//! # 1 回の ExecuteRequest に対する report
//! - 0 個以上の `ProgressReport`
//! - その後に terminal report がちょうど 1 つ（`CompletionReport` または `ErrorReport`）
//! - terminal report の後には何も送られない

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ErrorPayload;
use super::ids::RequestId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Controller → context: run the task registered under `task_type`.
    ExecuteRequest {
        request_id: RequestId,
        task_type: String,
        #[serde(default)]
        data: Value,
    },

    /// Controller → context: resolve and install libraries, in order.
    LoadLibraryRequest {
        request_id: RequestId,
        urls: Vec<String>,
    },

    ProgressReport {
        request_id: RequestId,
        step: u64,
    },

    CompletionReport {
        request_id: RequestId,
        result: Value,
    },

    ErrorReport {
        request_id: RequestId,
        error: ErrorPayload,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ProgressReport,
    CompletionReport,
    ErrorReport,
    ExecuteRequest,
    LoadLibraryRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToContext,
    ToController,
}

impl MessageKind {
    /// Numeric tag used by the first generation of the protocol.
    pub fn code(self) -> u8 {
        match self {
            MessageKind::ProgressReport => 1,
            MessageKind::CompletionReport => 2,
            MessageKind::ErrorReport => 3,
            MessageKind::ExecuteRequest => 4,
            MessageKind::LoadLibraryRequest => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MessageKind::ProgressReport),
            2 => Some(MessageKind::CompletionReport),
            3 => Some(MessageKind::ErrorReport),
            4 => Some(MessageKind::ExecuteRequest),
            5 => Some(MessageKind::LoadLibraryRequest),
            _ => None,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            MessageKind::ExecuteRequest | MessageKind::LoadLibraryRequest => Direction::ToContext,
            _ => Direction::ToController,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MessageKind::CompletionReport | MessageKind::ErrorReport)
    }
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::ExecuteRequest { .. } => MessageKind::ExecuteRequest,
            Message::LoadLibraryRequest { .. } => MessageKind::LoadLibraryRequest,
            Message::ProgressReport { .. } => MessageKind::ProgressReport,
            Message::CompletionReport { .. } => MessageKind::CompletionReport,
            Message::ErrorReport { .. } => MessageKind::ErrorReport,
        }
    }

    pub fn request_id(&self) -> RequestId {
        match self {
            Message::ExecuteRequest { request_id, .. }
            | Message::LoadLibraryRequest { request_id, .. }
            | Message::ProgressReport { request_id, .. }
            | Message::CompletionReport { request_id, .. }
            | Message::ErrorReport { request_id, .. } => *request_id,
        }
    }

    pub fn direction(&self) -> Direction {
        self.kind().direction()
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }
}
