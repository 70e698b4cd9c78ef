//! Transport module - how request bytes reach a server.
//!
//! The engine is transport-agnostic: it hands a fully framed and filtered
//! request to a [`Transport`] and gets response bytes back. Bundled
//! implementations:
//! - [`MemTransport`] - in-process loopback around a responder function
//! - [`AsyncBridge`] - adapts a blocking transport to the callback style

mod bridge;
mod mem;

use bytes::Bytes;

use crate::error::{CallwireError, Result};

pub use bridge::AsyncBridge;
pub use mem::MemTransport;

/// Completion callback for asynchronous sends.
pub type ResponseHandler = Box<dyn FnOnce(Result<Bytes>) + Send>;

/// Carries one request to the server and returns its response.
///
/// A transport may support the blocking style, the callback style, or
/// both. The defaults report the style as unsupported, so implementors
/// override only what they can actually do; the client surfaces the
/// mismatch as an [`CallwireError::Unsupported`] error at call time.
pub trait Transport: Send + Sync + 'static {
    /// Sends a request and blocks until the response arrives.
    fn send_and_receive(&self, request: Bytes) -> Result<Bytes> {
        let _ = request;
        Err(CallwireError::Unsupported(
            "this transport cannot invoke synchronously",
        ))
    }

    /// Sends a request and completes `on_response` when the response
    /// arrives. Must not block the caller.
    fn async_send_and_receive(&self, request: Bytes, on_response: ResponseHandler) {
        let _ = request;
        on_response(Err(CallwireError::Unsupported(
            "this transport cannot invoke asynchronously",
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoStyles;

    impl Transport for NoStyles {}

    #[test]
    fn test_default_sync_unsupported() {
        let err = NoStyles.send_and_receive(Bytes::new()).unwrap_err();
        assert!(matches!(err, CallwireError::Unsupported(_)));
    }

    #[test]
    fn test_default_async_reports_unsupported() {
        let (tx, rx) = std::sync::mpsc::channel();
        NoStyles.async_send_and_receive(
            Bytes::new(),
            Box::new(move |outcome| {
                tx.send(outcome).unwrap();
            }),
        );
        let outcome = rx.recv().unwrap();
        assert!(matches!(outcome, Err(CallwireError::Unsupported(_))));
    }
}
