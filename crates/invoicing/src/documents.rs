//! Status documents derived from an invoice.
//!
//! All three documents of one derivation share the invoice reference and a
//! single timestamp. Their ids are deterministic functions of the invoice id,
//! so they can be looked up without an index (and collide when derived twice).

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use statusdb_core::{DocumentId, Entity, InvoiceId, Timestamp};

use crate::status::Status;

/// How an invoice document refers to its invoice.
///
/// `key` is what goes into derived document ids; `field` is copied unchanged
/// into the `invoiceId` field of the derived documents (absent only when the
/// invoice has no `invoiceId` at all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRef {
    key: InvoiceId,
    field: Option<JsonValue>,
}

impl InvoiceRef {
    pub fn new(invoice_id: InvoiceId) -> Self {
        Self {
            field: Some(JsonValue::String(invoice_id.as_str().to_string())),
            key: invoice_id,
        }
    }

    /// Read `invoiceId` from an invoice document without validating anything else.
    ///
    /// The key is the value's string-concatenation text: strings verbatim,
    /// missing as `undefined`, `null` as `null`, integral numbers without a
    /// fraction, arrays as their comma-joined elements, objects as
    /// `[object Object]`. The field keeps the original JSON value.
    pub fn from_document(document: &JsonValue) -> Self {
        match document.get("invoiceId") {
            None => Self {
                key: InvoiceId::new("undefined"),
                field: None,
            },
            Some(value) => Self {
                key: InvoiceId::new(concat_text(value)),
                field: Some(value.clone()),
            },
        }
    }

    pub fn key(&self) -> &InvoiceId {
        &self.key
    }

    pub fn field(&self) -> Option<&JsonValue> {
        self.field.as_ref()
    }
}

fn concat_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => number_text(n),
        JsonValue::String(s) => s.clone(),
        // null elements join as empty strings
        JsonValue::Array(items) => items
            .iter()
            .map(|item| match item {
                JsonValue::Null => String::new(),
                other => concat_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        JsonValue::Object(_) => "[object Object]".to_string(),
    }
}

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

/// Latest known status of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStatusDocument {
    pub id: DocumentId,
    /// Number of status transitions after the initial one.
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<JsonValue>,
    pub created: Timestamp,
    pub modified: Timestamp,
    pub status: Status,
}

/// Append-only history of every status of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusesDocument {
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<JsonValue>,
    pub statuses: Vec<Status>,
    pub created: Timestamp,
    pub modified: Timestamp,
}

/// One immutable status record, addressable by invoice id and count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<JsonValue>,
    pub status: Status,
    pub created: Timestamp,
    pub is_status_doc: bool,
}

impl Entity for CurrentStatusDocument {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Entity for StatusesDocument {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Entity for StatusDocument {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// The three documents written when an invoice is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceStatusDocuments {
    pub current: CurrentStatusDocument,
    pub status: StatusDocument,
    pub statuses: StatusesDocument,
}

impl InvoiceStatusDocuments {
    /// Initial documents for a newly created invoice: state `pending`, count 0.
    pub fn pending(invoice: &InvoiceRef, created: Timestamp) -> Self {
        let status = Status::pending(created);
        let key = invoice.key();
        let field = invoice.field().cloned();

        let current = CurrentStatusDocument {
            id: key.current_status_document_id(),
            count: 0,
            invoice_id: field.clone(),
            created,
            modified: created,
            status: status.clone(),
        };

        let status_doc = StatusDocument {
            id: key.status_document_id(current.count),
            invoice_id: field.clone(),
            status: status.clone(),
            created,
            is_status_doc: true,
        };

        let statuses = StatusesDocument {
            id: key.statuses_document_id(),
            invoice_id: field,
            statuses: vec![status],
            created,
            modified: created,
        };

        Self {
            current,
            status: status_doc,
            statuses,
        }
    }
}
