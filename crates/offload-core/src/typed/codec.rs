//! PayloadCodec - JSON payload と Task の相互変換

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::errors::TaskError;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("json decode: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("json encode: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<CodecError> for TaskError {
    fn from(err: CodecError) -> Self {
        TaskError::InvalidPayload(err.to_string())
    }
}

/// Stateless converter between wire values and typed payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, CodecError> {
        serde_json::from_value(payload).map_err(CodecError::Decode)
    }

    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, CodecError> {
        serde_json::to_value(value).map_err(CodecError::Encode)
    }
}
