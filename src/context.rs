//! Per-invocation context.

use std::collections::HashMap;
use std::sync::Arc;

use rmpv::Value;

use crate::client::ClientCore;

/// State shared across the stages of a single invocation.
///
/// A fresh context is created per call and threaded through every filter
/// stage, outbound and inbound, so filters can stash values on the way out
/// and read them back on the way in. It also exposes the owning client's
/// core so filters can inspect configuration.
pub struct InvocationContext {
    client: Arc<ClientCore>,
    bag: HashMap<String, Value>,
}

impl InvocationContext {
    pub(crate) fn new(client: Arc<ClientCore>) -> Self {
        InvocationContext {
            client,
            bag: HashMap::new(),
        }
    }

    /// The shared core of the client running this invocation.
    pub fn client(&self) -> &ClientCore {
        &self.client
    }

    /// Stores a value under `key`, returning the previous one if any.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.bag.insert(key.into(), value)
    }

    /// Reads a value stored by an earlier stage.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bag.get(key)
    }

    /// Removes and returns a stored value.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.bag.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_roundtrip() {
        let mut context = InvocationContext::new(ClientCore::for_tests());
        assert!(context.get("token").is_none());

        context.set("token", Value::from("abc"));
        assert_eq!(context.get("token"), Some(&Value::from("abc")));

        let prev = context.set("token", Value::from("def"));
        assert_eq!(prev, Some(Value::from("abc")));

        assert_eq!(context.take("token"), Some(Value::from("def")));
        assert!(context.get("token").is_none());
    }
}
