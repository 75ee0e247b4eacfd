//! Command dispatcher
//!
//! The dispatcher is the external-operation shim: it accepts a validated
//! [`ArgumentBag`] for a command path and forwards it to the bound operation,
//! propagating the collaborator's result or failure unchanged. No retries,
//! no reinterpretation, no business logic.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::bag::ArgumentBag;
use crate::client::RestError;
use crate::error::{CoreError, Result};

/// A bound external operation, typically a management-plane call.
#[async_trait]
pub trait Operation: Send + Sync {
    async fn invoke(&self, bag: ArgumentBag) -> std::result::Result<Value, RestError>;
}

/// Maps command paths to bound operations.
#[derive(Default)]
pub struct Dispatcher {
    ops: HashMap<String, Box<dyn Operation>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an operation to a command path. Later bindings replace earlier
    /// ones for the same path.
    pub fn bind(&mut self, path: impl Into<String>, op: Box<dyn Operation>) {
        self.ops.insert(path.into(), op);
    }

    pub fn is_bound(&self, path: &str) -> bool {
        self.ops.contains_key(path)
    }

    /// Forward the bag to the operation bound at `path`. The operation's
    /// error surfaces verbatim as [`CoreError::Remote`].
    pub async fn dispatch(&self, path: &str, bag: ArgumentBag) -> Result<Value> {
        let op = self.ops.get(path).ok_or_else(|| CoreError::UnknownCommand {
            path: path.to_string(),
        })?;
        debug!(command = path, flags = bag.len(), "dispatching");
        Ok(op.invoke(bag).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::FlagValue;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Operation for Echo {
        async fn invoke(&self, bag: ArgumentBag) -> std::result::Result<Value, RestError> {
            Ok(json!({"name": bag.get_str("name")}))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Operation for AlwaysFails {
        async fn invoke(&self, _bag: ArgumentBag) -> std::result::Result<Value, RestError> {
            Err(RestError::ServerError("backend unavailable".into()))
        }
    }

    #[tokio::test]
    async fn dispatch_forwards_bag_and_result() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.bind("account show", Box::new(Echo));

        let mut bag = ArgumentBag::new();
        bag.insert("name", FlagValue::Str("acct1".into()));
        let out = dispatcher.dispatch("account show", bag).await.unwrap();
        assert_eq!(out, json!({"name": "acct1"}));
    }

    #[tokio::test]
    async fn dispatch_propagates_remote_error_unchanged() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.bind("account delete", Box::new(AlwaysFails));

        let err = dispatcher
            .dispatch("account delete", ArgumentBag::new())
            .await
            .unwrap_err();
        match err {
            CoreError::Remote(RestError::ServerError(msg)) => {
                assert_eq!(msg, "backend unavailable")
            }
            other => panic!("expected remote passthrough, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn dispatch_unknown_path() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher
            .dispatch("account bogus", ArgumentBag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownCommand { .. }));
    }
}
