//! Trigger registration and execution around document writes.

pub mod host;
pub mod registry;

pub use host::{CreateDocumentOptions, TriggerHost};
pub use registry::{RegisteredTrigger, TriggerRegistry};
