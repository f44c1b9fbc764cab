//! Collection write contract (mechanics only).
//!
//! A write against a collection happens in two phases:
//!
//! ```text
//! create_document(body)
//!   ├─ Admission::Rejected   (synchronous; the host refused to queue the write)
//!   └─ Admission::Admitted(PendingWrite)
//!         └─ .completion().await
//!               ├─ WriteOutcome::Completed(StoredDocument)
//!               └─ WriteOutcome::Failed(WriteError)
//! ```
//!
//! Admission is the host's resource-budget control and is **not** an error.
//! A completion failure is.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tokio::sync::oneshot;

use statusdb_core::{DocumentId, Entity};

use crate::links::CollectionLink;

/// Failure reported by a write's completion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// A document with the same id already exists in the collection.
    #[error("resource with id '{id}' already exists")]
    Conflict { id: String },

    /// The serialized document exceeds the collection's size limit.
    #[error("document '{id}' is {size} bytes, limit is {limit}")]
    TooLarge { id: String, size: usize, limit: usize },

    /// The body is not a storable document (not an object, missing `id`, ...).
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The collection could not take the write (e.g. a poisoned lock).
    #[error("collection unavailable: {0}")]
    Unavailable(String),

    /// The collection dropped the write without reporting an outcome.
    #[error("write completion was dropped")]
    Dropped,
}

/// A document as persisted by a collection, with its system properties.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    id: DocumentId,
    rid: String,
    self_link: String,
    etag: String,
    ts: i64,
    body: JsonValue,
}

impl StoredDocument {
    pub fn new(
        id: DocumentId,
        rid: impl Into<String>,
        self_link: impl Into<String>,
        etag: impl Into<String>,
        ts: i64,
        body: JsonValue,
    ) -> Self {
        Self {
            id,
            rid: rid.into(),
            self_link: self_link.into(),
            etag: etag.into(),
            ts,
            body,
        }
    }

    pub fn rid(&self) -> &str {
        &self.rid
    }

    pub fn self_link(&self) -> &str {
        &self.self_link
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Unix seconds of the last write.
    pub fn ts(&self) -> i64 {
        self.ts
    }

    /// The document body exactly as written (no system properties).
    pub fn body(&self) -> &JsonValue {
        &self.body
    }

    /// Body with `_rid`, `_self`, `_etag` and `_ts` merged in, as returned on reads.
    pub fn to_json(&self) -> JsonValue {
        let mut map = match &self.body {
            JsonValue::Object(m) => m.clone(),
            _ => Map::new(),
        };
        map.insert("_rid".to_string(), JsonValue::String(self.rid.clone()));
        map.insert("_self".to_string(), JsonValue::String(self.self_link.clone()));
        map.insert("_etag".to_string(), JsonValue::String(self.etag.clone()));
        map.insert("_ts".to_string(), JsonValue::from(self.ts));
        JsonValue::Object(map)
    }
}

impl Entity for StoredDocument {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Asynchronous result of an admitted write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Completed(StoredDocument),
    Failed(WriteError),
}

impl WriteOutcome {
    pub fn into_result(self) -> Result<StoredDocument, WriteError> {
        match self {
            WriteOutcome::Completed(doc) => Ok(doc),
            WriteOutcome::Failed(err) => Err(err),
        }
    }
}

/// Sending half of a pending write, held by the collection.
#[derive(Debug)]
pub struct CompletionSender {
    tx: oneshot::Sender<WriteOutcome>,
}

impl CompletionSender {
    /// Deliver the outcome. If the waiter is gone the outcome is discarded.
    pub fn complete(self, outcome: WriteOutcome) {
        let _ = self.tx.send(outcome);
    }
}

/// Receiving half of an admitted write.
#[derive(Debug)]
pub struct PendingWrite {
    rx: oneshot::Receiver<WriteOutcome>,
}

impl PendingWrite {
    /// Create a linked sender / pending write pair.
    pub fn channel() -> (CompletionSender, PendingWrite) {
        let (tx, rx) = oneshot::channel();
        (CompletionSender { tx }, PendingWrite { rx })
    }

    /// A pending write whose outcome is already known.
    pub fn ready(outcome: WriteOutcome) -> Self {
        let (tx, pending) = Self::channel();
        tx.complete(outcome);
        pending
    }

    /// Wait for the write to finish.
    pub async fn completion(self) -> WriteOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => WriteOutcome::Failed(WriteError::Dropped),
        }
    }
}

/// Synchronous answer to "was this write accepted for queuing".
#[derive(Debug)]
pub enum Admission {
    Admitted(PendingWrite),
    Rejected { reason: String },
}

impl Admission {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

/// Write capability of the collection a trigger runs against.
pub trait DocumentCollection: Send + Sync {
    fn link(&self) -> &CollectionLink;

    /// Enqueue a document create.
    ///
    /// Must not block on the write itself; the outcome arrives through the
    /// returned `PendingWrite`.
    fn create_document(&self, body: JsonValue) -> Admission;
}

impl<C> DocumentCollection for std::sync::Arc<C>
where
    C: DocumentCollection + ?Sized,
{
    fn link(&self) -> &CollectionLink {
        (**self).link()
    }

    fn create_document(&self, body: JsonValue) -> Admission {
        (**self).create_document(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(body: JsonValue) -> StoredDocument {
        StoredDocument::new(
            DocumentId::new("doc-1").unwrap(),
            "rid-1",
            "dbs/db/colls/c/docs/doc-1",
            "\"etag-1\"",
            1_700_000_000,
            body,
        )
    }

    #[test]
    fn to_json_merges_system_properties() {
        let doc = stored(json!({ "id": "doc-1", "value": 3 }));
        let json = doc.to_json();
        assert_eq!(json["id"], "doc-1");
        assert_eq!(json["value"], 3);
        assert_eq!(json["_rid"], "rid-1");
        assert_eq!(json["_self"], "dbs/db/colls/c/docs/doc-1");
        assert_eq!(json["_etag"], "\"etag-1\"");
        assert_eq!(json["_ts"], 1_700_000_000);
        // body stays untouched
        assert!(doc.body().get("_rid").is_none());
    }

    #[tokio::test]
    async fn ready_pending_write_yields_outcome() {
        let doc = stored(json!({ "id": "doc-1" }));
        let pending = PendingWrite::ready(WriteOutcome::Completed(doc.clone()));
        assert_eq!(pending.completion().await, WriteOutcome::Completed(doc));
    }

    #[tokio::test]
    async fn dropped_sender_reports_dropped() {
        let (tx, pending) = PendingWrite::channel();
        drop(tx);
        assert_eq!(
            pending.completion().await,
            WriteOutcome::Failed(WriteError::Dropped)
        );
    }

    #[test]
    fn conflict_message_names_the_id() {
        let err = WriteError::Conflict {
            id: "INV-1.test.statuses".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "resource with id 'INV-1.test.statuses' already exists"
        );
    }
}
