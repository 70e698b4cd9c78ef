//! Filters and async callbacks example.
//!
//! This example demonstrates:
//! - Registering byte-level filters and removing them by handle
//! - How filters run forward outbound and in reverse inbound
//! - Asynchronous invocation with callback shapes
//!
//! Run with `cargo run --example filters`.

use std::sync::Arc;

use bytes::Bytes;
use callwire_client::transport::MemTransport;
use callwire_client::{Callback, Client, Filter, InvocationContext, Value};

/// XORs every byte with a key, both directions.
///
/// Applying it twice restores the original, so the loopback server sees
/// scrambled bytes while the client converses normally.
struct XorFilter(u8);

impl Filter for XorFilter {
    fn encode(&self, request: Bytes, _context: &mut InvocationContext) -> Bytes {
        request.iter().map(|b| b ^ self.0).collect()
    }

    fn decode(&self, response: Bytes, _context: &mut InvocationContext) -> Bytes {
        response.iter().map(|b| b ^ self.0).collect()
    }
}

/// Logs traffic sizes without touching the bytes.
struct SizeLogger;

impl Filter for SizeLogger {
    fn encode(&self, request: Bytes, _context: &mut InvocationContext) -> Bytes {
        tracing::info!("outbound: {} bytes", request.len());
        request
    }

    fn decode(&self, response: Bytes, _context: &mut InvocationContext) -> Bytes {
        tracing::info!("inbound: {} bytes", response.len());
        response
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // The server un-scrambles with the same key the client filter uses.
    let key = 0x5A;
    let transport = MemTransport::new(move |request| {
        let plain: Bytes = request.iter().map(|b| b ^ key).collect();
        tracing::info!("server saw {} plain bytes", plain.len());

        let mut response = vec![b'R'];
        rmpv::encode::write_value(&mut response, &Value::from("pong"))?;
        response.push(b'z');
        Ok(response.iter().map(|b| b ^ key).collect())
    });

    let client = Client::builder(transport)
        .filter(Arc::new(SizeLogger))
        .filter(Arc::new(XorFilter(key)))
        .build();

    let answer = client.root().call("ping", &mut [])?;
    println!("sync ping = {answer}");

    // Async invocation delivers the outcome to a callback shape.
    let (tx, rx) = std::sync::mpsc::channel();
    client.root().call_async(
        "ping",
        Vec::new(),
        Callback::on_result(move |result| {
            let _ = tx.send(result);
        }),
    );
    println!("async ping = {:?}", rx.recv()?);

    // Filters can be retired by handle at any point between calls.
    let handle = client.add_filter(Arc::new(SizeLogger));
    client.root().call("ping", &mut [])?;
    client.remove_filter(handle);

    Ok(())
}
