//! Sequential write chain.
//!
//! Issues dependent document creates one after another against a single
//! collection:
//!
//! - a write is only issued once the previous one completed successfully
//! - `Admission::Rejected` stops the chain quietly (`ChainOutcome::Halted`)
//! - `WriteOutcome::Failed` stops the chain with `TriggerError::WriteFailed`
//!
//! Nothing already written is rolled back.

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use statusdb_core::{DocumentId, Entity};

use crate::collection::{Admission, DocumentCollection, WriteOutcome};
use crate::trigger::TriggerError;

/// How a chain ended when no write failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every write was admitted and completed.
    Completed { written: Vec<DocumentId> },
    /// A write was not admitted; later writes were never issued.
    Halted {
        written: Vec<DocumentId>,
        rejected_id: String,
        reason: String,
    },
}

impl ChainOutcome {
    /// Outcome of a trigger that issued no writes.
    pub fn nothing_written() -> Self {
        Self::Completed {
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[DocumentId] {
        match self {
            ChainOutcome::Completed { written } | ChainOutcome::Halted { written, .. } => written,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ChainOutcome::Completed { .. })
    }
}

/// Ordered list of documents to create.
#[derive(Debug, Clone, Default)]
pub struct WriteChain {
    steps: Vec<JsonValue>,
}

impl WriteChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to the chain.
    pub fn then<T: Serialize>(mut self, document: &T) -> Result<Self, TriggerError> {
        let body = serde_json::to_value(document)
            .map_err(|e| TriggerError::InvalidRequest(format!("document serialization failed: {e}")))?;
        self.steps.push(body);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the chain to completion, rejection, or the first failure.
    pub async fn run(
        self,
        collection: &dyn DocumentCollection,
    ) -> Result<ChainOutcome, TriggerError> {
        let total = self.steps.len();
        let mut written = Vec::with_capacity(total);

        for (step, body) in self.steps.into_iter().enumerate() {
            let id = body
                .get("id")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string();

            let pending = match collection.create_document(body) {
                Admission::Admitted(pending) => pending,
                Admission::Rejected { reason } => {
                    debug!(
                        collection = %collection.link(),
                        document_id = %id,
                        step = step + 1,
                        total,
                        %reason,
                        "write not admitted; halting chain"
                    );
                    return Ok(ChainOutcome::Halted {
                        written,
                        rejected_id: id,
                        reason,
                    });
                }
            };

            match pending.completion().await {
                WriteOutcome::Completed(stored) => {
                    debug!(
                        collection = %collection.link(),
                        document_id = %stored.id(),
                        step = step + 1,
                        total,
                        "document written"
                    );
                    written.push(stored.id().clone());
                }
                WriteOutcome::Failed(source) => {
                    debug!(
                        collection = %collection.link(),
                        document_id = %id,
                        step = step + 1,
                        total,
                        error = %source,
                        "write failed; aborting chain"
                    );
                    return Err(TriggerError::WriteFailed { id, source });
                }
            }
        }

        Ok(ChainOutcome::Completed { written })
    }
}
