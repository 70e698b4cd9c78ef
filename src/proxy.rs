//! Method namespace proxies.
//!
//! Remote method names are flat strings with `_`-joined namespace
//! segments. A [`Proxy`] holds a prefix and resolves call names against
//! it, so `client.root().extend("math").call("add", ...)` invokes
//! `math_add` on the server.

use rmpv::Value;

use crate::client::{Callback, Client, InvokeOptions};
use crate::error::Result;
use crate::protocol::CallResult;
use crate::transport::Transport;

/// Separator between namespace segments in resolved method names.
pub const SEPARATOR: &str = "_";

/// A call-name namespace over a shared client.
pub struct Proxy<T: Transport> {
    client: Client<T>,
    prefix: String,
}

impl<T: Transport> Clone for Proxy<T> {
    fn clone(&self) -> Self {
        Proxy {
            client: self.client.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

impl<T: Transport> Proxy<T> {
    pub(crate) fn new(client: Client<T>, prefix: String) -> Self {
        Proxy { client, prefix }
    }

    /// The accumulated namespace prefix, separator included.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// A child proxy one namespace segment deeper.
    pub fn extend(&self, segment: &str) -> Proxy<T> {
        Proxy {
            client: self.client.clone(),
            prefix: format!("{}{segment}{SEPARATOR}", self.prefix),
        }
    }

    /// The full method name `name` resolves to under this proxy.
    pub fn resolve(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    /// Calls `name` with default options, returning the decoded value.
    pub fn call(&self, name: &str, args: &mut [Value]) -> Result<Value> {
        Ok(self
            .call_with(name, args, InvokeOptions::new())?
            .into_value())
    }

    /// Calls `name` with explicit options.
    pub fn call_with(
        &self,
        name: &str,
        args: &mut [Value],
        options: InvokeOptions,
    ) -> Result<CallResult> {
        self.client.invoke(&self.resolve(name), args, options)
    }

    /// Calls `name` asynchronously with default options.
    pub fn call_async(&self, name: &str, args: Vec<Value>, callback: Callback) {
        self.call_async_with(name, args, InvokeOptions::new(), callback);
    }

    /// Calls `name` asynchronously with explicit options.
    pub fn call_async_with(
        &self,
        name: &str,
        args: Vec<Value>,
        options: InvokeOptions,
        callback: Callback,
    ) {
        self.client
            .invoke_async(&self.resolve(name), args, options, callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemTransport;
    use bytes::Bytes;

    fn test_client() -> Client<MemTransport> {
        Client::builder(MemTransport::new(|_| Ok(Bytes::from_static(b"z")))).build()
    }

    #[test]
    fn test_root_resolves_bare_names() {
        let proxy = test_client().root();
        assert_eq!(proxy.prefix(), "");
        assert_eq!(proxy.resolve("hello"), "hello");
    }

    #[test]
    fn test_extend_accumulates_segments() {
        let proxy = test_client().root().extend("foo").extend("bar");
        assert_eq!(proxy.prefix(), "foo_bar_");
        assert_eq!(proxy.resolve("baz"), "foo_bar_baz");
    }

    #[test]
    fn test_sibling_proxies_are_independent() {
        let root = test_client().root();
        let a = root.extend("a");
        let b = root.extend("b");
        assert_eq!(a.resolve("f"), "a_f");
        assert_eq!(b.resolve("f"), "b_f");
        assert_eq!(root.resolve("f"), "f");
    }
}
