//! Codec module - serialization seam between the engine and the wire.
//!
//! The invocation engine treats payloads as opaque: it writes tags itself
//! and asks the codec to produce or consume exactly one serialized value
//! per block. [`MsgPackCodec`] is the bundled implementation.
//!
//! # Design
//!
//! The seam is a trait object rather than static dispatch so a client can
//! swap serialization formats at build time without re-parameterizing the
//! whole engine. Only [`Codec::write_value`] and [`Codec::read_value`] are
//! required; the string/bool/list helpers and raw capture are provided on
//! top of them.
//!
//! # Example
//!
//! ```
//! use callwire_client::codec::{Codec, MsgPackCodec};
//! use callwire_client::protocol::ResponseCursor;
//! use callwire_client::Value;
//! use bytes::Bytes;
//!
//! let codec = MsgPackCodec;
//! let mut out = Vec::new();
//! codec.write_value(&mut out, &Value::from("hello"), true).unwrap();
//!
//! let buf = Bytes::from(out);
//! let mut cursor = ResponseCursor::new(&buf);
//! assert_eq!(codec.read_value(&mut cursor).unwrap(), Value::from("hello"));
//! ```

mod msgpack;

use bytes::Bytes;
use rmpv::Value;

use crate::error::{CallwireError, Result};
use crate::protocol::ResponseCursor;

pub use msgpack::{from_value, to_value, MsgPackCodec};

/// Serialization seam used by the invocation engine.
///
/// `simple` is a hint that payloads contain no shared or cyclic structure,
/// letting codecs with a reference-tracking mode skip it. Codecs without
/// such a mode ignore the flag.
pub trait Codec: Send + Sync {
    /// Appends one serialized value to `out`.
    fn write_value(&self, out: &mut Vec<u8>, value: &Value, simple: bool) -> Result<()>;

    /// Consumes exactly one serialized value from the cursor.
    fn read_value(&self, input: &mut ResponseCursor<'_>) -> Result<Value>;

    /// Appends a serialized string.
    fn write_str(&self, out: &mut Vec<u8>, s: &str, simple: bool) -> Result<()> {
        self.write_value(out, &Value::from(s), simple)
    }

    /// Appends a serialized boolean.
    fn write_bool(&self, out: &mut Vec<u8>, b: bool, simple: bool) -> Result<()> {
        self.write_value(out, &Value::from(b), simple)
    }

    /// Appends a serialized list of values.
    fn write_values(&self, out: &mut Vec<u8>, values: &[Value], simple: bool) -> Result<()> {
        self.write_value(out, &Value::Array(values.to_vec()), simple)
    }

    /// Consumes one value and requires it to be a list.
    fn read_values(&self, input: &mut ResponseCursor<'_>) -> Result<Vec<Value>> {
        match self.read_value(input)? {
            Value::Array(values) => Ok(values),
            other => Err(CallwireError::protocol(
                format!("expected a value list, got {other}"),
                input.response().clone(),
            )),
        }
    }

    /// Consumes one value and requires it to be a string.
    fn read_str(&self, input: &mut ResponseCursor<'_>) -> Result<String> {
        match self.read_value(input)? {
            Value::String(s) => s.into_str().ok_or_else(|| {
                CallwireError::protocol(
                    "string value is not valid UTF-8",
                    input.response().clone(),
                )
            }),
            other => Err(CallwireError::protocol(
                format!("expected a string, got {other}"),
                input.response().clone(),
            )),
        }
    }

    /// Consumes one value but returns its raw bytes instead of decoding it.
    fn read_raw(&self, input: &mut ResponseCursor<'_>) -> Result<Bytes> {
        let start = input.position();
        self.read_value(input)?;
        let end = input.position();
        Ok(input.slice_between(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_values_rejects_non_list() {
        let codec = MsgPackCodec;
        let mut out = Vec::new();
        codec.write_value(&mut out, &Value::from(7), true).unwrap();

        let buf = Bytes::from(out);
        let mut cursor = ResponseCursor::new(&buf);
        let err = codec.read_values(&mut cursor).unwrap_err();
        assert!(matches!(err, CallwireError::Protocol { .. }));
    }

    #[test]
    fn test_read_str_rejects_non_string() {
        let codec = MsgPackCodec;
        let mut out = Vec::new();
        codec.write_bool(&mut out, true, true).unwrap();

        let buf = Bytes::from(out);
        let mut cursor = ResponseCursor::new(&buf);
        let err = codec.read_str(&mut cursor).unwrap_err();
        assert!(matches!(err, CallwireError::Protocol { .. }));
    }

    #[test]
    fn test_read_raw_captures_exact_span() {
        let codec = MsgPackCodec;
        let mut out = Vec::new();
        codec.write_str(&mut out, "payload", true).unwrap();
        let value_len = out.len();
        out.push(b'z');

        let buf = Bytes::from(out);
        let mut cursor = ResponseCursor::new(&buf);
        let raw = codec.read_raw(&mut cursor).unwrap();
        assert_eq!(raw.len(), value_len);
        assert_eq!(cursor.position(), value_len);
    }
}
