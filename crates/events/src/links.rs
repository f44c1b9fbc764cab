//! Resource links (`dbs/<db>/colls/<coll>/...`).

use serde::{Deserialize, Serialize};

/// Address of a collection inside a database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionLink {
    database_id: String,
    collection_id: String,
}

impl CollectionLink {
    pub fn new(database_id: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            collection_id: collection_id.into(),
        }
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    /// `dbs/<db>`
    pub fn database_link(&self) -> String {
        format!("dbs/{}", self.database_id)
    }

    /// `dbs/<db>/colls/<coll>`; also the collection's self link.
    pub fn self_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database_id, self.collection_id)
    }

    /// `dbs/<db>/colls/<coll>/docs`
    pub fn docs_link(&self) -> String {
        format!("{}/docs", self.self_link())
    }

    /// `dbs/<db>/colls/<coll>/docs/<id>`
    pub fn doc_link(&self, document_id: &str) -> String {
        format!("{}/docs/{}", self.self_link(), document_id)
    }

    /// `dbs/<db>/colls/<coll>/triggers/<id>`
    pub fn trigger_link(&self, trigger_id: &str) -> String {
        format!("{}/triggers/{}", self.self_link(), trigger_id)
    }
}

impl core::fmt::Display for CollectionLink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.self_link())
    }
}
