//! In-memory document collection and the per-invocation write handle.

pub mod budget;
pub mod handle;
pub mod in_memory;

pub use budget::{BudgetPolicy, RequestBudget};
pub use handle::CollectionHandle;
pub use in_memory::{InMemoryCollection, InsertOutcome, WriteMode, DEFAULT_MAX_DOCUMENT_BYTES};
