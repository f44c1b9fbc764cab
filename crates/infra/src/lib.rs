//! Host infrastructure: in-memory collection, request budgets, trigger
//! registry and the create pipeline that runs triggers, plus configuration.

pub mod collection;
pub mod config;
pub mod definitions;
pub mod error;
pub mod triggers;


pub use collection::{BudgetPolicy, CollectionHandle, InMemoryCollection, RequestBudget, WriteMode};
pub use config::{ConfigError, HostConfig};
pub use error::HostError;
pub use triggers::{CreateDocumentOptions, TriggerHost, TriggerRegistry};
