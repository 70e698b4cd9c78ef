//! In-process loopback transport.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;
use crate::transport::{ResponseHandler, Transport};

/// Loopback transport that answers requests with a responder function.
///
/// Useful for tests and demos: the responder plays the server role without
/// any I/O. Both invocation styles are supported; the callback style
/// completes inline on the calling thread.
///
/// # Example
///
/// ```
/// use callwire_client::transport::{MemTransport, Transport};
/// use bytes::Bytes;
///
/// let transport = MemTransport::new(|_request| Ok(Bytes::from_static(b"z")));
/// let response = transport.send_and_receive(Bytes::from_static(b"Cz")).unwrap();
/// assert_eq!(response, Bytes::from_static(b"z"));
/// ```
#[derive(Clone)]
pub struct MemTransport {
    responder: Arc<dyn Fn(Bytes) -> Result<Bytes> + Send + Sync>,
}

impl MemTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(Bytes) -> Result<Bytes> + Send + Sync + 'static,
    {
        MemTransport {
            responder: Arc::new(responder),
        }
    }
}

impl Transport for MemTransport {
    fn send_and_receive(&self, request: Bytes) -> Result<Bytes> {
        (self.responder)(request)
    }

    fn async_send_and_receive(&self, request: Bytes, on_response: ResponseHandler) {
        on_response((self.responder)(request));
    }
}
