//! Collection definitions: which triggers a collection carries.
//!
//! The file is a JSON array of collection entries. Fields this host has no use
//! for (offer, indexing policy, partition key, udfs, sprocs) are ignored.
//!
//! ```json
//! [{
//!   "databaseId": "invoicing",
//!   "collectionId": "invoices",
//!   "triggers": [{
//!     "id": "triggerPostCreateInvoice",
//!     "triggerType": "Post",
//!     "triggerOperation": "Create",
//!     "body": { "sourceLocation": "builtin", "handler": "postCreateInvoice" }
//!   }]
//! }]
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use statusdb_events::{CollectionLink, Trigger, TriggerDefinition, TriggerOperation, TriggerType};
use statusdb_invoicing::{POST_CREATE_INVOICE_HANDLER, PostCreateInvoiceTrigger};

use crate::config::ConfigError;
use crate::error::HostError;
use crate::triggers::TriggerRegistry;

/// Source location of handlers compiled into this host.
pub const BUILTIN_SOURCE: &str = "builtin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    pub database_id: String,
    pub collection_id: String,
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSpec {
    pub id: String,
    pub trigger_type: TriggerType,
    pub trigger_operation: TriggerOperation,
    pub body: TriggerBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerBody {
    /// `builtin`, `inline` or `file`.
    pub source_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl TriggerSpec {
    pub fn definition(&self) -> TriggerDefinition {
        TriggerDefinition::new(self.id.clone(), self.trigger_type, self.trigger_operation)
    }
}

/// A trigger ready to be registered.
pub type Registration = (TriggerDefinition, Arc<dyn Trigger>);

pub fn load(path: &Path) -> Result<Vec<CollectionDefinition>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &raw)
}

/// Parse definitions text; `path` is only used in error messages.
pub fn parse(path: &Path, raw: &str) -> Result<Vec<CollectionDefinition>, ConfigError> {
    serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The post-create invoice trigger under its own id.
pub fn default_registrations() -> Vec<Registration> {
    let trigger: Arc<dyn Trigger> = Arc::new(PostCreateInvoiceTrigger::new());
    vec![(trigger.definition().clone(), trigger)]
}

/// Triggers the definitions declare for `link`.
///
/// Falls back to `default_registrations` when no entry matches the collection.
pub fn registrations_for(
    definitions: &[CollectionDefinition],
    link: &CollectionLink,
) -> Result<Vec<Registration>, ConfigError> {
    let Some(entry) = definitions
        .iter()
        .find(|d| d.database_id == link.database_id() && d.collection_id == link.collection_id())
    else {
        return Ok(default_registrations());
    };

    entry
        .triggers
        .iter()
        .map(|spec| builtin_handler(spec).map(|trigger| (spec.definition(), trigger)))
        .collect()
}

/// Register every entry, replacing triggers already registered under the same id.
pub fn install(registry: &TriggerRegistry, registrations: Vec<Registration>) -> Result<(), HostError> {
    for (definition, trigger) in registrations {
        registry.upsert(definition, trigger)?;
    }
    Ok(())
}

fn builtin_handler(spec: &TriggerSpec) -> Result<Arc<dyn Trigger>, ConfigError> {
    if spec.body.source_location != BUILTIN_SOURCE {
        return Err(ConfigError::UnsupportedSource {
            id: spec.id.clone(),
            location: spec.body.source_location.clone(),
        });
    }
    match spec.body.handler.as_deref() {
        Some(POST_CREATE_INVOICE_HANDLER) => Ok(Arc::new(PostCreateInvoiceTrigger::new())),
        other => Err(ConfigError::UnknownHandler {
            id: spec.id.clone(),
            handler: other.unwrap_or_default().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statusdb_invoicing::POST_CREATE_INVOICE_TRIGGER_ID;

    const DEFINITIONS: &str = r#"[
        {
            "databaseId": "invoicing",
            "collectionId": "invoices",
            "offer": { "throughput": 400 },
            "indexingPolicy": { "indexingMode": "consistent" },
            "triggers": [{
                "id": "statusOnCreate",
                "triggerType": "Post",
                "triggerOperation": "Create",
                "body": { "sourceLocation": "builtin", "handler": "postCreateInvoice" }
            }],
            "udfs": [],
            "sprocs": []
        },
        {
            "databaseId": "invoicing",
            "collectionId": "archive",
            "triggers": [{
                "id": "legacy",
                "triggerType": "Post",
                "triggerOperation": "All",
                "body": { "sourceLocation": "file", "fileName": "legacy.js" }
            }]
        }
    ]"#;

    fn defs() -> Vec<CollectionDefinition> {
        parse(Path::new("defs.json"), DEFINITIONS).unwrap()
    }

    #[test]
    fn parses_and_ignores_unused_fields() {
        let defs = defs();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].triggers[0].trigger_type, TriggerType::Post);
        assert_eq!(defs[1].triggers[0].body.file_name.as_deref(), Some("legacy.js"));
    }

    #[test]
    fn builtin_handler_is_registered_under_declared_id() {
        let regs = registrations_for(&defs(), &CollectionLink::new("invoicing", "invoices")).unwrap();
        assert_eq!(regs.len(), 1);
        let (def, _) = &regs[0];
        assert_eq!(
            def,
            &TriggerDefinition::new("statusOnCreate", TriggerType::Post, TriggerOperation::Create)
        );
    }

    #[test]
    fn script_sources_are_unsupported() {
        let err = registrations_for(&defs(), &CollectionLink::new("invoicing", "archive"))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::UnsupportedSource { id, location } if id == "legacy" && location == "file"));
    }

    #[test]
    fn unknown_handler_is_rejected() {
        let raw = r#"[{ "databaseId": "d", "collectionId": "c", "triggers": [{
            "id": "t", "triggerType": "Pre", "triggerOperation": "Create",
            "body": { "sourceLocation": "builtin", "handler": "shipOrder" } }] }]"#;
        let defs = parse(Path::new("x.json"), raw).unwrap();
        let err = registrations_for(&defs, &CollectionLink::new("d", "c")).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownHandler { handler, .. } if handler == "shipOrder"));
    }

    #[test]
    fn unmatched_collection_gets_default_trigger() {
        let regs = registrations_for(&defs(), &CollectionLink::new("other", "invoices")).unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].0.id, POST_CREATE_INVOICE_TRIGGER_ID);
    }

    #[test]
    fn malformed_file_reports_path() {
        let err = parse(Path::new("broken.json"), "{ nope").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse broken.json"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load(Path::new("/nonexistent/statusdb/defs.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn install_registers_everything() {
        let registry = TriggerRegistry::new();
        install(&registry, default_registrations()).unwrap();
        install(&registry, default_registrations()).unwrap();
        assert_eq!(registry.list().len(), 1);
    }
}
