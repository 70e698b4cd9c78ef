//! Protocol module - envelope tags, framing, and response scanning.
//!
//! This module implements the tag-delimited envelope format:
//! - single-byte ASCII tags delimiting serialized values
//! - request serialization (`write_request`)
//! - the response scanning loop (`parse_response`)

mod cursor;
mod envelope;
pub mod tags;

pub use cursor::ResponseCursor;
pub use envelope::{parse_response, write_request, CallResult, ResultMode};
