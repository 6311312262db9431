//! Domain - ドメインモデル（ids, message, errors）

pub mod errors;
pub mod ids;
pub mod message;

pub use self::errors::{ErrorKind, ErrorPayload, TaskError};
pub use self::ids::{HandleId, RequestId};
pub use self::message::{Direction, Message, MessageKind};
