//! Trigger abstraction (host-invoked handlers bound to document writes).
//!
//! A trigger is registered on a collection with a type (runs before or after
//! the write) and an operation filter. The host calls `Trigger::run` with an
//! explicit `TriggerContext` instead of any ambient "current request" lookup:
//! the request body, the collection handle and the clock all arrive as
//! parameters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use statusdb_core::Clock;

use crate::chain::ChainOutcome;
use crate::collection::{DocumentCollection, WriteError};

/// When the trigger runs relative to the triggering write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    Pre,
    Post,
}

/// Which write operations the trigger is bound to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerOperation {
    All,
    Create,
    Replace,
    Delete,
}

impl TriggerOperation {
    /// Whether a trigger registered for `self` fires on `operation`.
    pub fn applies_to(self, operation: TriggerOperation) -> bool {
        self == TriggerOperation::All || self == operation
    }
}

/// Registration metadata of a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
    pub id: String,
    pub trigger_type: TriggerType,
    pub trigger_operation: TriggerOperation,
}

impl TriggerDefinition {
    pub fn new(
        id: impl Into<String>,
        trigger_type: TriggerType,
        trigger_operation: TriggerOperation,
    ) -> Self {
        Self {
            id: id.into(),
            trigger_type,
            trigger_operation,
        }
    }
}

/// Failure that terminates a trigger invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// An admitted write reported an error on completion.
    #[error("write of document '{id}' failed: {source}")]
    WriteFailed {
        id: String,
        #[source]
        source: WriteError,
    },

    /// The trigger could not turn the request into documents.
    #[error("invalid trigger request: {0}")]
    InvalidRequest(String),
}

/// Everything a trigger invocation may touch.
pub struct TriggerContext<'a> {
    operation: TriggerOperation,
    body: JsonValue,
    collection: &'a dyn DocumentCollection,
    clock: &'a dyn Clock,
}

impl<'a> TriggerContext<'a> {
    pub fn new(
        operation: TriggerOperation,
        body: JsonValue,
        collection: &'a dyn DocumentCollection,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            operation,
            body,
            collection,
            clock,
        }
    }

    /// The operation that fired the trigger.
    pub fn operation(&self) -> TriggerOperation {
        self.operation
    }

    /// The request body: the document about to be written (pre) or just written (post).
    pub fn body(&self) -> &JsonValue {
        &self.body
    }

    /// Mutable request body. Only pre-trigger changes reach the stored document.
    pub fn body_mut(&mut self) -> &mut JsonValue {
        &mut self.body
    }

    pub fn into_body(self) -> JsonValue {
        self.body
    }

    /// The collection that received the triggering write.
    pub fn collection(&self) -> &'a dyn DocumentCollection {
        self.collection
    }

    pub fn clock(&self) -> &'a dyn Clock {
        self.clock
    }
}

impl core::fmt::Debug for TriggerContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TriggerContext")
            .field("operation", &self.operation)
            .field("collection", self.collection.link())
            .field("body", &self.body)
            .finish()
    }
}

/// A trigger implementation.
#[async_trait]
pub trait Trigger: Send + Sync {
    /// Default registration (id, type, operation).
    fn definition(&self) -> &TriggerDefinition;

    async fn run(&self, ctx: &mut TriggerContext<'_>) -> Result<ChainOutcome, TriggerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_applies_to_every_operation() {
        for op in [
            TriggerOperation::Create,
            TriggerOperation::Replace,
            TriggerOperation::Delete,
        ] {
            assert!(TriggerOperation::All.applies_to(op));
        }
        assert!(TriggerOperation::Create.applies_to(TriggerOperation::Create));
        assert!(!TriggerOperation::Create.applies_to(TriggerOperation::Replace));
    }

    #[test]
    fn definition_uses_camel_case_wire_names() {
        let def = TriggerDefinition::new(
            "triggerPostCreateInvoice",
            TriggerType::Post,
            TriggerOperation::Create,
        );
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            json!({
                "id": "triggerPostCreateInvoice",
                "triggerType": "Post",
                "triggerOperation": "Create"
            })
        );
    }

    #[test]
    fn write_failed_keeps_source() {
        let err = TriggerError::WriteFailed {
            id: "x".to_string(),
            source: WriteError::Conflict { id: "x".to_string() },
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("resource with id 'x' already exists"));
    }
}
