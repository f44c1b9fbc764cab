//! Document create pipeline with pre- and post-triggers.
//!
//! ```text
//! create_document(body, options)
//!   ↓
//! 1. Classify the write (Create, or Replace for an upsert of an existing id)
//!   ↓
//! 2. Resolve requested triggers (registered, right type, operation applies)
//!   ↓
//! 3. Run pre-triggers in request order; each may rewrite the body
//!   ↓
//! 4. Store the document
//!   ↓
//! 5. Run post-triggers in request order against the stored body
//! ```
//!
//! Every trigger invocation gets its own request budget and a handle on the
//! same collection. A failing post-trigger fails the call but the stored
//! document and whatever the trigger already wrote stay in place.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use statusdb_core::{Clock, Entity, SystemClock};
use statusdb_events::{
    ChainOutcome, StoredDocument, TriggerContext, TriggerOperation, TriggerType,
};

use crate::collection::{BudgetPolicy, CollectionHandle, InMemoryCollection, WriteMode};
use crate::config::HostConfig;
use crate::error::HostError;

use super::registry::{RegisteredTrigger, TriggerRegistry};

/// Per-request options of a document create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDocumentOptions {
    /// Replace an existing document with the same id instead of failing.
    pub is_upsert: bool,
    /// Ids of pre-triggers to run, in order.
    pub pre_triggers_include: Vec<String>,
    /// Ids of post-triggers to run, in order.
    pub post_triggers_include: Vec<String>,
}

impl CreateDocumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(mut self) -> Self {
        self.is_upsert = true;
        self
    }

    pub fn with_pre_trigger(mut self, id: impl Into<String>) -> Self {
        self.pre_triggers_include.push(id.into());
        self
    }

    pub fn with_post_trigger(mut self, id: impl Into<String>) -> Self {
        self.post_triggers_include.push(id.into());
        self
    }
}

/// Runs document creates against one collection with its registered triggers.
pub struct TriggerHost {
    collection: Arc<InMemoryCollection>,
    registry: TriggerRegistry,
    clock: Arc<dyn Clock>,
    budget: BudgetPolicy,
}

impl TriggerHost {
    pub fn new(collection: Arc<InMemoryCollection>) -> Self {
        Self {
            collection,
            registry: TriggerRegistry::new(),
            clock: Arc::new(SystemClock),
            budget: BudgetPolicy::default(),
        }
    }

    /// Empty collection and budget as configured; no triggers registered.
    pub fn from_config(config: &HostConfig) -> Self {
        let collection = InMemoryCollection::new(config.collection_link())
            .with_max_document_bytes(config.max_document_bytes);
        Self::new(Arc::new(collection)).with_budget(config.budget)
    }

    /// Clock handed to triggers.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_budget(mut self, budget: BudgetPolicy) -> Self {
        self.budget = budget;
        self
    }

    pub fn collection(&self) -> &Arc<InMemoryCollection> {
        &self.collection
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    pub async fn create_document(
        &self,
        body: JsonValue,
        options: &CreateDocumentOptions,
    ) -> Result<StoredDocument, HostError> {
        let operation = self.classify(&body, options);
        let pre = self.resolve(&options.pre_triggers_include, TriggerType::Pre, operation)?;
        let post = self.resolve(&options.post_triggers_include, TriggerType::Post, operation)?;

        let mut body = body;
        for registered in &pre {
            let (rewritten, _) = self.invoke(registered, operation, body).await?;
            body = rewritten;
        }

        let mode = if options.is_upsert {
            WriteMode::Upsert
        } else {
            WriteMode::Create
        };
        let inserted = self.collection.insert(body, mode)?;
        let stored = inserted.document;
        info!(
            collection = %self.collection.link(),
            id = %stored.id(),
            replaced = inserted.replaced,
            "document stored"
        );

        for registered in &post {
            self.invoke(registered, operation, stored.body().clone())
                .await?;
        }

        Ok(stored)
    }

    fn classify(&self, body: &JsonValue, options: &CreateDocumentOptions) -> TriggerOperation {
        let existing = body
            .get("id")
            .and_then(JsonValue::as_str)
            .is_some_and(|id| self.collection.contains(id));
        if options.is_upsert && existing {
            TriggerOperation::Replace
        } else {
            TriggerOperation::Create
        }
    }

    fn resolve(
        &self,
        ids: &[String],
        expected: TriggerType,
        operation: TriggerOperation,
    ) -> Result<Vec<RegisteredTrigger>, HostError> {
        ids.iter()
            .map(|id| {
                let registered = self.registry.get(id)?;
                let def = &registered.definition;
                if def.trigger_type != expected {
                    return Err(HostError::TriggerMismatch {
                        id: id.clone(),
                        reason: format!(
                            "registered as {:?} trigger, requested as {:?}",
                            def.trigger_type, expected
                        ),
                    });
                }
                if !def.trigger_operation.applies_to(operation) {
                    return Err(HostError::TriggerMismatch {
                        id: id.clone(),
                        reason: format!(
                            "registered for {:?}, request is {:?}",
                            def.trigger_operation, operation
                        ),
                    });
                }
                Ok(registered)
            })
            .collect()
    }

    /// Run one trigger with a fresh budget; returns the (possibly rewritten) body.
    async fn invoke(
        &self,
        registered: &RegisteredTrigger,
        operation: TriggerOperation,
        body: JsonValue,
    ) -> Result<(JsonValue, ChainOutcome), HostError> {
        let id = &registered.definition.id;
        let handle = CollectionHandle::new(Arc::clone(&self.collection), self.budget.budget());
        let mut ctx = TriggerContext::new(operation, body, &handle, self.clock.as_ref());

        let outcome = match registered.trigger.run(&mut ctx).await {
            Ok(outcome) => outcome,
            Err(source) => {
                warn!(trigger = %id, error = %source, "trigger failed");
                return Err(HostError::Trigger {
                    id: id.clone(),
                    source,
                });
            }
        };

        if let ChainOutcome::Halted {
            rejected_id,
            reason,
            ..
        } = &outcome
        {
            warn!(
                trigger = %id,
                rejected = %rejected_id,
                %reason,
                consumed = handle.budget().consumed(),
                "trigger stopped at a rejected write"
            );
        }

        Ok((ctx.into_body(), outcome))
    }
}

impl core::fmt::Debug for TriggerHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TriggerHost")
            .field("collection", &self.collection)
            .field("registry", &self.registry)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statusdb_events::{CollectionLink, TriggerDefinition, WriteError};
    use statusdb_invoicing::{POST_CREATE_INVOICE_TRIGGER_ID, PostCreateInvoiceTrigger};

    fn host() -> TriggerHost {
        let coll = Arc::new(InMemoryCollection::new(CollectionLink::new("db", "c")));
        let host = TriggerHost::new(coll);
        host.registry()
            .register_default(Arc::new(PostCreateInvoiceTrigger::new()))
            .unwrap();
        host
    }

    #[test]
    fn options_builder_collects_trigger_ids() {
        let opts = CreateDocumentOptions::new()
            .upsert()
            .with_pre_trigger("a")
            .with_post_trigger("b")
            .with_post_trigger("c");
        assert!(opts.is_upsert);
        assert_eq!(opts.pre_triggers_include, vec!["a"]);
        assert_eq!(opts.post_triggers_include, vec!["b", "c"]);
    }

    #[test]
    fn upsert_of_existing_document_is_a_replace() {
        let h = host();
        h.collection()
            .insert(json!({ "id": "x" }), WriteMode::Create)
            .unwrap();

        let plain = CreateDocumentOptions::new();
        let upsert = CreateDocumentOptions::new().upsert();
        assert_eq!(h.classify(&json!({ "id": "x" }), &plain), TriggerOperation::Create);
        assert_eq!(h.classify(&json!({ "id": "x" }), &upsert), TriggerOperation::Replace);
        assert_eq!(h.classify(&json!({ "id": "y" }), &upsert), TriggerOperation::Create);
    }

    #[test]
    fn post_trigger_requested_as_pre_is_a_mismatch() {
        let h = host();
        let err = h
            .resolve(
                &[POST_CREATE_INVOICE_TRIGGER_ID.to_string()],
                TriggerType::Pre,
                TriggerOperation::Create,
            )
            .unwrap_err();
        assert!(matches!(err, HostError::TriggerMismatch { .. }));
    }

    #[test]
    fn create_trigger_does_not_fire_on_replace() {
        let h = host();
        let err = h
            .resolve(
                &[POST_CREATE_INVOICE_TRIGGER_ID.to_string()],
                TriggerType::Post,
                TriggerOperation::Replace,
            )
            .unwrap_err();
        match err {
            HostError::TriggerMismatch { id, reason } => {
                assert_eq!(id, POST_CREATE_INVOICE_TRIGGER_ID);
                assert!(reason.contains("Replace"));
            }
            other => panic!("expected TriggerMismatch, got {other:?}"),
        }
    }

    #[test]
    fn all_operation_trigger_fires_on_replace() {
        let h = host();
        let def = TriggerDefinition::new("everything", TriggerType::Post, TriggerOperation::All);
        h.registry()
            .register(def, Arc::new(PostCreateInvoiceTrigger::new()))
            .unwrap();
        let resolved = h
            .resolve(
                &["everything".to_string()],
                TriggerType::Post,
                TriggerOperation::Replace,
            )
            .unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[tokio::test]
    async fn unresolvable_trigger_stores_nothing() {
        let h = host();
        let opts = CreateDocumentOptions::new().with_post_trigger("missing");
        let err = h
            .create_document(json!({ "id": "INV-1", "invoiceId": "INV-1" }), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownTrigger(id) if id == "missing"));
        assert!(h.collection().is_empty());
    }

    #[tokio::test]
    async fn conflicting_create_skips_post_triggers() {
        let h = host();
        h.collection()
            .insert(json!({ "id": "INV-1" }), WriteMode::Create)
            .unwrap();
        let opts = CreateDocumentOptions::new().with_post_trigger(POST_CREATE_INVOICE_TRIGGER_ID);
        let err = h
            .create_document(json!({ "id": "INV-1", "invoiceId": "INV-1" }), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Write(WriteError::Conflict { .. })));
        assert_eq!(h.collection().len(), 1);
    }
}
