use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::Value as JsonValue;
use uuid::Uuid;

use statusdb_core::{Clock, DocumentId, Entity, SystemClock};
use statusdb_events::{CollectionLink, StoredDocument, WriteError};

/// Largest serialized document accepted by default (2 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 2 * 1024 * 1024;

/// How `insert` treats an existing document with the same id.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with `WriteError::Conflict`.
    Create,
    /// Replace it.
    Upsert,
}

/// Result of a successful `insert`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    pub document: StoredDocument,
    /// Whether an existing document was replaced (upsert only).
    pub replaced: bool,
}

/// In-memory document collection keyed by document id.
///
/// Intended for tests/dev and the local host. Documents are kept in id order.
pub struct InMemoryCollection {
    link: CollectionLink,
    max_document_bytes: usize,
    clock: Arc<dyn Clock>,
    documents: RwLock<BTreeMap<DocumentId, StoredDocument>>,
}

impl InMemoryCollection {
    pub fn new(link: CollectionLink) -> Self {
        Self {
            link,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            clock: Arc::new(SystemClock),
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_max_document_bytes(mut self, max_document_bytes: usize) -> Self {
        self.max_document_bytes = max_document_bytes;
        self
    }

    /// Clock used for the `_ts` system property.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn link(&self) -> &CollectionLink {
        &self.link
    }

    /// Store a document body.
    ///
    /// The body must be a JSON object with a non-empty string `id`.
    pub fn insert(&self, body: JsonValue, mode: WriteMode) -> Result<InsertOutcome, WriteError> {
        let id = document_id(&body)?;

        let size = serialized_len(&body);
        if size > self.max_document_bytes {
            return Err(WriteError::TooLarge {
                id: id.into_string(),
                size,
                limit: self.max_document_bytes,
            });
        }

        let mut documents = self
            .documents
            .write()
            .map_err(|_| WriteError::Unavailable("lock poisoned".to_string()))?;

        let replaced = documents.contains_key(&id);
        if replaced && mode == WriteMode::Create {
            return Err(WriteError::Conflict {
                id: id.into_string(),
            });
        }

        let rid = match documents.get(&id) {
            Some(existing) => existing.rid().to_string(),
            None => Uuid::now_v7().simple().to_string(),
        };
        let stored = StoredDocument::new(
            id.clone(),
            rid,
            self.link.doc_link(id.as_str()),
            format!("\"{}\"", Uuid::now_v7()),
            self.clock.now().unix_seconds(),
            body,
        );
        documents.insert(id, stored.clone());

        Ok(InsertOutcome {
            document: stored,
            replaced,
        })
    }

    pub fn get(&self, id: &str) -> Option<StoredDocument> {
        let key = DocumentId::new(id).ok()?;
        let documents = self.documents.read().ok()?;
        documents.get(&key).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All documents, ordered by id.
    pub fn list(&self) -> Vec<StoredDocument> {
        match self.documents.read() {
            Ok(documents) => documents.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    /// Ids of all documents, ordered.
    pub fn ids(&self) -> Vec<DocumentId> {
        self.list().iter().map(|doc| doc.id().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for InMemoryCollection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryCollection")
            .field("link", &self.link)
            .field("max_document_bytes", &self.max_document_bytes)
            .field("documents", &self.len())
            .finish()
    }
}

/// Serialized size in bytes, as charged and size-checked.
pub(crate) fn serialized_len(body: &JsonValue) -> usize {
    serde_json::to_vec(body).map(|b| b.len()).unwrap_or(0)
}

fn document_id(body: &JsonValue) -> Result<DocumentId, WriteError> {
    let JsonValue::Object(map) = body else {
        return Err(WriteError::InvalidDocument(
            "document body must be a JSON object".to_string(),
        ));
    };
    let raw = map
        .get("id")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| WriteError::InvalidDocument("document must have a string 'id'".to_string()))?;
    DocumentId::new(raw).map_err(|e| WriteError::InvalidDocument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statusdb_core::{FixedClock, Timestamp};

    fn collection() -> InMemoryCollection {
        let t: Timestamp = "2024-06-01T00:00:10.000Z".parse().unwrap();
        InMemoryCollection::new(CollectionLink::new("billing", "invoices"))
            .with_clock(Arc::new(FixedClock::new(t)))
    }

    #[test]
    fn insert_assigns_system_properties() {
        let coll = collection();
        let out = coll
            .insert(json!({ "id": "INV-1", "invoiceId": "INV-1" }), WriteMode::Create)
            .unwrap();

        assert!(!out.replaced);
        let doc = out.document;
        assert_eq!(doc.id().as_str(), "INV-1");
        assert_eq!(doc.self_link(), "dbs/billing/colls/invoices/docs/INV-1");
        assert_eq!(doc.ts(), 1_717_200_010);
        assert!(doc.etag().starts_with('"') && doc.etag().ends_with('"'));
        assert!(!doc.rid().is_empty());
        assert_eq!(coll.get("INV-1"), Some(doc));
    }

    #[test]
    fn create_conflicts_on_existing_id() {
        let coll = collection();
        coll.insert(json!({ "id": "a" }), WriteMode::Create).unwrap();
        let err = coll
            .insert(json!({ "id": "a", "v": 2 }), WriteMode::Create)
            .unwrap_err();
        assert_eq!(err, WriteError::Conflict { id: "a".to_string() });
        assert_eq!(coll.get("a").unwrap().body(), &json!({ "id": "a" }));
    }

    #[test]
    fn upsert_replaces_and_keeps_rid() {
        let coll = collection();
        let first = coll.insert(json!({ "id": "a" }), WriteMode::Upsert).unwrap();
        let second = coll
            .insert(json!({ "id": "a", "v": 2 }), WriteMode::Upsert)
            .unwrap();

        assert!(second.replaced);
        assert_eq!(first.document.rid(), second.document.rid());
        assert_ne!(first.document.etag(), second.document.etag());
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn rejects_bodies_without_string_id() {
        let coll = collection();
        for body in [json!([1, 2]), json!({ "id": 7 }), json!({ "id": "" }), json!({})] {
            let err = coll.insert(body, WriteMode::Create).unwrap_err();
            assert!(matches!(err, WriteError::InvalidDocument(_)));
        }
        assert!(coll.is_empty());
    }

    #[test]
    fn rejects_documents_over_size_limit() {
        let coll = collection().with_max_document_bytes(32);
        let err = coll
            .insert(json!({ "id": "big", "pad": "x".repeat(64) }), WriteMode::Create)
            .unwrap_err();
        match err {
            WriteError::TooLarge { id, size, limit } => {
                assert_eq!(id, "big");
                assert!(size > limit);
                assert_eq!(limit, 32);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn lists_in_id_order() {
        let coll = collection();
        for id in ["c", "a", "b"] {
            coll.insert(json!({ "id": id }), WriteMode::Create).unwrap();
        }
        let ids: Vec<String> = coll.ids().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
