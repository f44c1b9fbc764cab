//! Trigger mechanics: the collection write contract, trigger definitions and
//! the sequential write chain triggers use to issue dependent writes.

pub mod chain;
pub mod collection;
pub mod links;
pub mod trigger;

pub use chain::{ChainOutcome, WriteChain};
pub use collection::{
    Admission, CompletionSender, DocumentCollection, PendingWrite, StoredDocument, WriteError,
    WriteOutcome,
};
pub use links::CollectionLink;
pub use trigger::{
    Trigger, TriggerContext, TriggerDefinition, TriggerError, TriggerOperation, TriggerType,
};
