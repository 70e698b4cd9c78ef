//! MsgPack codec using the `rmp` family.
//!
//! Dynamic values on the wire go through `rmpv`; the typed helpers at the
//! API boundary go through `rmp-serde`.
//!
//! # Named vs. positional structs
//!
//! - `to_vec_named` serializes structs as maps (with field names)
//! - `to_vec` serializes structs as arrays (positional)
//!
//! Peers that look up fields by name need the map format, so named encoding
//! is the default and positional is opted into through simple mode.
//!
//! # Example
//!
//! ```
//! use callwire_client::codec::{to_value, from_value};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message {
//!     id: u32,
//!     content: String,
//! }
//!
//! let msg = Message { id: 42, content: "hello".to_string() };
//! let value = to_value(&msg, false).unwrap();
//! let decoded: Message = from_value(&value).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use rmpv::Value;

use crate::codec::Codec;
use crate::error::Result;
use crate::protocol::ResponseCursor;

/// MessagePack codec.
///
/// MsgPack is self-describing and has no reference-tracking mode, so the
/// simple flag changes nothing here. It still matters at the typed
/// boundary, where it selects positional struct encoding.
pub struct MsgPackCodec;

impl Codec for MsgPackCodec {
    fn write_value(&self, out: &mut Vec<u8>, value: &Value, _simple: bool) -> Result<()> {
        rmpv::encode::write_value(out, value)?;
        Ok(())
    }

    fn read_value(&self, input: &mut ResponseCursor<'_>) -> Result<Value> {
        Ok(rmpv::decode::read_value(input)?)
    }
}

/// Converts a serializable type into a dynamic value.
///
/// With `simple` set, structs encode positionally (`to_vec`); otherwise
/// they encode as maps with field names (`to_vec_named`).
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn to_value<T: serde::Serialize>(value: &T, simple: bool) -> Result<Value> {
    let bytes = if simple {
        rmp_serde::to_vec(value)?
    } else {
        rmp_serde::to_vec_named(value)?
    };
    Ok(rmpv::decode::read_value(&mut &bytes[..])?)
}

/// Converts a dynamic value into a deserializable type.
///
/// # Errors
///
/// Returns an error if the value does not match type T.
pub fn from_value<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T> {
    let mut bytes = Vec::new();
    rmpv::encode::write_value(&mut bytes, value)?;
    Ok(rmp_serde::from_slice(&bytes)?)
}
