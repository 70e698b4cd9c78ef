//! Request and response envelope framing.
//!
//! The framing algorithm is codec-agnostic: tags delimit blocks, and the
//! codec consumes or produces exactly one serialized value per block. The
//! client never interprets payload bytes itself.

use bytes::Bytes;
use rmpv::Value;

use crate::codec::Codec;
use crate::error::{CallwireError, Result};
use crate::protocol::cursor::ResponseCursor;
use crate::protocol::tags;

/// How much decoding the caller wants applied to the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// Fully decode the result and apply error/argument blocks.
    #[default]
    Normal,
    /// Scan the envelope but keep the result block's payload serialized.
    Serialized,
    /// Return the raw response with the terminator tag stripped.
    Raw,
    /// Return the raw response untouched.
    RawWithEndTag,
}

/// Outcome of a successful call, shaped by the [`ResultMode`] used.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// Decoded result value.
    Value(Value),
    /// Still-serialized result payload.
    Serialized(Bytes),
    /// Raw response bytes.
    Raw(Bytes),
}

impl CallResult {
    /// The decoded value, or `Value::Nil` for the serialized/raw shapes.
    pub fn into_value(self) -> Value {
        match self {
            CallResult::Value(value) => value,
            CallResult::Serialized(_) | CallResult::Raw(_) => Value::Nil,
        }
    }

    /// The undecoded payload, or `None` for the decoded shape.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            CallResult::Value(_) => None,
            CallResult::Serialized(bytes) | CallResult::Raw(bytes) => Some(bytes),
        }
    }
}

/// Serializes a request envelope.
///
/// Layout: `C <name> [<args> [true]] z`. The argument list is written only
/// when there are arguments or when `byref` forces an (empty) list so the
/// by-reference marker has somewhere to sit.
pub fn write_request(
    codec: &dyn Codec,
    name: &str,
    args: &[Value],
    byref: bool,
    simple: bool,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(64);
    out.push(tags::TAG_CALL);
    codec.write_str(&mut out, name, simple)?;
    if !args.is_empty() || byref {
        codec.write_values(&mut out, args, simple)?;
        if byref {
            codec.write_bool(&mut out, true, simple)?;
        }
    }
    out.push(tags::TAG_END);
    Ok(out)
}

/// Scans a response envelope, updating `args` in place when an argument
/// block arrives and returning the call's result.
///
/// A response with no result block yields `Value::Nil`. A second result
/// block, an unknown tag, or input that ends before the terminator tag is
/// a protocol error carrying the full response.
pub fn parse_response(
    codec: &dyn Codec,
    response: &Bytes,
    args: &mut [Value],
    mode: ResultMode,
) -> Result<CallResult> {
    match mode {
        ResultMode::RawWithEndTag => return Ok(CallResult::Raw(response.clone())),
        ResultMode::Raw => {
            let len = response.len().saturating_sub(1);
            return Ok(CallResult::Raw(response.slice(..len)));
        }
        ResultMode::Normal | ResultMode::Serialized => {}
    }

    let mut cursor = ResponseCursor::new(response);
    let mut result: Option<CallResult> = None;

    loop {
        let Some(tag) = cursor.next_tag() else {
            return Err(CallwireError::protocol(
                "response ended before the terminator tag",
                response.clone(),
            ));
        };
        match tag {
            tags::TAG_END => break,
            tags::TAG_RESULT => {
                if result.is_some() {
                    return Err(CallwireError::protocol(
                        "duplicate result block in response",
                        response.clone(),
                    ));
                }
                result = Some(if mode == ResultMode::Serialized {
                    CallResult::Serialized(codec.read_raw(&mut cursor)?)
                } else {
                    CallResult::Value(codec.read_value(&mut cursor)?)
                });
            }
            tags::TAG_ARGUMENT => {
                let updated = codec.read_values(&mut cursor)?;
                for (slot, value) in args.iter_mut().zip(updated) {
                    *slot = value;
                }
            }
            tags::TAG_ERROR => {
                let message = codec.read_str(&mut cursor)?;
                return Err(CallwireError::Remote(message));
            }
            other => {
                return Err(CallwireError::protocol(
                    format!("unexpected tag 0x{other:02x} in response"),
                    response.clone(),
                ));
            }
        }
    }

    Ok(result.unwrap_or(CallResult::Value(Value::Nil)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgPackCodec;

    fn encode_value(value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        rmpv::encode::write_value(&mut out, value).unwrap();
        out
    }

    fn response_with_result(value: &Value) -> Bytes {
        let mut bytes = vec![tags::TAG_RESULT];
        bytes.extend(encode_value(value));
        bytes.push(tags::TAG_END);
        Bytes::from(bytes)
    }

    #[test]
    fn test_write_request_no_args() {
        let codec = MsgPackCodec;
        let request = write_request(&codec, "ping", &[], false, true).unwrap();
        assert_eq!(request[0], tags::TAG_CALL);
        assert_eq!(*request.last().unwrap(), tags::TAG_END);
        // No argument list between name and terminator.
        assert_eq!(request.len(), 1 + encode_value(&Value::from("ping")).len() + 1);
    }

    #[test]
    fn test_write_request_byref_forces_args() {
        let codec = MsgPackCodec;
        let without = write_request(&codec, "f", &[], false, true).unwrap();
        let with = write_request(&codec, "f", &[], true, true).unwrap();
        assert!(with.len() > without.len());
    }

    #[test]
    fn test_parse_result_block() {
        let codec = MsgPackCodec;
        let response = response_with_result(&Value::from(42));
        let result = parse_response(&codec, &response, &mut [], ResultMode::Normal).unwrap();
        assert_eq!(result, CallResult::Value(Value::from(42)));
    }

    #[test]
    fn test_parse_empty_envelope_is_nil() {
        let codec = MsgPackCodec;
        let response = Bytes::from_static(b"z");
        let result = parse_response(&codec, &response, &mut [], ResultMode::Normal).unwrap();
        assert_eq!(result.into_value(), Value::Nil);
    }

    #[test]
    fn test_parse_argument_block_updates_prefix() {
        let codec = MsgPackCodec;
        let mut bytes = vec![tags::TAG_ARGUMENT];
        bytes.extend(encode_value(&Value::Array(vec![
            Value::from(9),
            Value::from(8),
        ])));
        bytes.push(tags::TAG_END);
        let response = Bytes::from(bytes);

        let mut args = vec![Value::from(1), Value::from(2), Value::from(3)];
        parse_response(&codec, &response, &mut args, ResultMode::Normal).unwrap();
        assert_eq!(args, vec![Value::from(9), Value::from(8), Value::from(3)]);
    }

    #[test]
    fn test_parse_error_block() {
        let codec = MsgPackCodec;
        let mut bytes = vec![tags::TAG_ERROR];
        bytes.extend(encode_value(&Value::from("boom")));
        bytes.push(tags::TAG_END);
        let response = Bytes::from(bytes);

        let err = parse_response(&codec, &response, &mut [], ResultMode::Normal).unwrap_err();
        match err {
            CallwireError::Remote(message) => assert_eq!(message, "boom"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_duplicate_result_rejected() {
        let codec = MsgPackCodec;
        let mut bytes = vec![tags::TAG_RESULT];
        bytes.extend(encode_value(&Value::from(1)));
        bytes.push(tags::TAG_RESULT);
        bytes.extend(encode_value(&Value::from(2)));
        bytes.push(tags::TAG_END);
        let response = Bytes::from(bytes);

        let err = parse_response(&codec, &response, &mut [], ResultMode::Normal).unwrap_err();
        assert!(matches!(err, CallwireError::Protocol { .. }));
    }

    #[test]
    fn test_parse_unknown_tag_rejected() {
        let codec = MsgPackCodec;
        let response = Bytes::from_static(b"Qz");
        let err = parse_response(&codec, &response, &mut [], ResultMode::Normal).unwrap_err();
        match err {
            CallwireError::Protocol { message, response: kept } => {
                assert!(message.contains("0x51"));
                assert_eq!(kept, Bytes::from_static(b"Qz"));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_truncated_response() {
        let codec = MsgPackCodec;
        let mut bytes = vec![tags::TAG_RESULT];
        bytes.extend(encode_value(&Value::from(42)));
        // Terminator missing.
        let response = Bytes::from(bytes);
        let err = parse_response(&codec, &response, &mut [], ResultMode::Normal).unwrap_err();
        assert!(matches!(err, CallwireError::Protocol { .. }));
    }

    #[test]
    fn test_serialized_mode_keeps_payload() {
        let codec = MsgPackCodec;
        let payload = encode_value(&Value::from(42));
        let response = response_with_result(&Value::from(42));

        let result = parse_response(&codec, &response, &mut [], ResultMode::Serialized).unwrap();
        assert_eq!(result, CallResult::Serialized(Bytes::from(payload)));
    }

    #[test]
    fn test_raw_modes() {
        let codec = MsgPackCodec;
        let response = response_with_result(&Value::from(true));

        let raw = parse_response(&codec, &response, &mut [], ResultMode::Raw).unwrap();
        assert_eq!(
            raw,
            CallResult::Raw(response.slice(..response.len() - 1))
        );

        let full = parse_response(&codec, &response, &mut [], ResultMode::RawWithEndTag).unwrap();
        assert_eq!(full, CallResult::Raw(response.clone()));
    }
}
