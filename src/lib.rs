//! # callwire-client
//!
//! Client-side invocation engine for the Callwire tag-delimited binary
//! RPC protocol.
//!
//! ## Architecture
//!
//! - **Envelope** (`protocol`): single-byte tags delimiting serialized values
//! - **Codec** (`codec`): pluggable serialization, MsgPack bundled
//! - **Filters** (`filter`): byte-level transforms around every invocation
//! - **Transport** (`transport`): pluggable byte exchange, sync and async
//!
//! ## Example
//!
//! ```
//! use callwire_client::transport::MemTransport;
//! use callwire_client::{Client, Value};
//! use bytes::Bytes;
//!
//! // A responder playing the server role: always answers R "hi" z.
//! let transport = MemTransport::new(|_request| {
//!     let mut response = vec![b'R'];
//!     rmpv::encode::write_value(&mut response, &Value::from("hi")).unwrap();
//!     response.push(b'z');
//!     Ok(Bytes::from(response))
//! });
//!
//! let client = Client::new(transport, "mem://demo");
//! let greeting = client.root().call("greet", &mut []).unwrap();
//! assert_eq!(greeting, Value::from("hi"));
//! ```

pub mod codec;
pub mod error;
pub mod filter;
pub mod protocol;
pub mod transport;

mod client;
mod context;
mod proxy;

pub use client::{
    Callback, Client, ClientBuilder, ClientCore, InvokeOptions, UnhandledErrorHook,
};
pub use context::InvocationContext;
pub use error::{CallwireError, Result};
pub use filter::{Filter, FilterHandle};
pub use protocol::{CallResult, ResultMode};
pub use proxy::{Proxy, SEPARATOR};
pub use transport::Transport;

pub use rmpv::Value;
