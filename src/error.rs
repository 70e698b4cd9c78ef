//! Error types for callwire-client.

use bytes::Bytes;
use thiserror::Error;

/// Main error type for all callwire operations.
#[derive(Debug, Error)]
pub enum CallwireError {
    /// I/O error while reading or writing serialized values.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode a dynamic value.
    #[error("value encode error: {0}")]
    ValueEncode(#[from] rmpv::encode::Error),

    /// Failed to decode a dynamic value.
    #[error("value decode error: {0}")]
    ValueDecode(#[from] rmpv::decode::Error),

    /// MsgPack serialization error at the typed boundary.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error at the typed boundary.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// The transport does not support the requested invocation style.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The server reported an error for this call.
    #[error("remote error: {0}")]
    Remote(String),

    /// Malformed response envelope. Carries the full response bytes so
    /// callers can inspect what the server actually sent.
    #[error("protocol error: {message}")]
    Protocol {
        message: String,
        response: Bytes,
    },

    /// Transport-level failure outside of std::io.
    #[error("transport error: {0}")]
    Transport(String),
}

impl CallwireError {
    /// Builds a [`CallwireError::Protocol`] carrying the offending response.
    pub fn protocol(message: impl Into<String>, response: Bytes) -> Self {
        CallwireError::Protocol {
            message: message.into(),
            response,
        }
    }
}

/// Result type alias using CallwireError.
pub type Result<T> = std::result::Result<T, CallwireError>;
