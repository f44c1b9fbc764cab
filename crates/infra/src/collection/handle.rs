use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;

use statusdb_events::{Admission, CollectionLink, DocumentCollection, PendingWrite, WriteOutcome};

use super::budget::RequestBudget;
use super::in_memory::{InMemoryCollection, WriteMode, serialized_len};

/// A collection as seen by one trigger invocation: shared storage plus the
/// invocation's own request budget.
#[derive(Debug)]
pub struct CollectionHandle {
    collection: Arc<InMemoryCollection>,
    budget: RequestBudget,
}

impl CollectionHandle {
    pub fn new(collection: Arc<InMemoryCollection>, budget: RequestBudget) -> Self {
        Self { collection, budget }
    }

    pub fn budget(&self) -> &RequestBudget {
        &self.budget
    }

    pub fn collection(&self) -> &Arc<InMemoryCollection> {
        &self.collection
    }
}

impl DocumentCollection for CollectionHandle {
    fn link(&self) -> &CollectionLink {
        self.collection.link()
    }

    fn create_document(&self, body: JsonValue) -> Admission {
        let charge = self.budget.create_charge(serialized_len(&body));
        if !self.budget.try_charge(charge) {
            return Admission::rejected(format!(
                "request budget exhausted: create needs {charge} units, {} remaining",
                self.budget.remaining()
            ));
        }

        let (tx, pending) = PendingWrite::channel();
        let outcome = match self.collection.insert(body, WriteMode::Create) {
            Ok(inserted) => WriteOutcome::Completed(inserted.document),
            Err(err) => WriteOutcome::Failed(err),
        };
        debug!(
            collection = %self.collection.link(),
            charge,
            remaining = self.budget.remaining(),
            ok = matches!(outcome, WriteOutcome::Completed(_)),
            "create admitted"
        );
        tx.complete(outcome);

        Admission::Admitted(pending)
    }
}
