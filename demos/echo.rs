//! Echo client - simple request/response example.
//!
//! This example demonstrates:
//! - Creating a Callwire client with the builder pattern
//! - Answering requests with an in-process loopback transport
//! - Calling methods through namespace proxies
//!
//! Run with `cargo run --example echo`.

use bytes::Bytes;
use callwire_client::codec::{Codec, MsgPackCodec};
use callwire_client::protocol::{tags, ResponseCursor};
use callwire_client::transport::MemTransport;
use callwire_client::{Client, Value};

/// A loopback responder that echoes the first argument back as the result.
fn echo_server(request: Bytes) -> callwire_client::Result<Bytes> {
    let codec = MsgPackCodec;
    let mut cursor = ResponseCursor::new(&request);
    cursor.next_tag();
    let name = codec.read_str(&mut cursor)?;
    let args = if cursor.remaining() > 1 {
        codec.read_values(&mut cursor)?
    } else {
        Vec::new()
    };
    tracing::info!("serving '{}' with {} argument(s)", name, args.len());

    let mut response = vec![tags::TAG_RESULT];
    let result = args.into_iter().next().unwrap_or(Value::Nil);
    codec.write_value(&mut response, &result, true)?;
    response.push(tags::TAG_END);
    Ok(Bytes::from(response))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Build the client with the fluent API
    let client = Client::builder(MemTransport::new(echo_server))
        .url("mem://echo")
        .simple_mode(true)
        .build();

    let root = client.root();
    let echoed = root.call("echo", &mut [Value::from("hello")])?;
    println!("echo(\"hello\") = {echoed}");

    // Namespaced calls resolve against the proxy prefix
    let deep = root.extend("util");
    let echoed = deep.call("echo", &mut [Value::from(42)])?;
    println!("util_echo(42) = {echoed}");

    Ok(())
}
