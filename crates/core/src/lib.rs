//! Domain building blocks shared by every crate.
//!
//! This crate contains **pure** primitives (no IO, no storage): identifiers,
//! timestamps and the clock seam, and the domain error model.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use entity::Entity;
pub use error::DomainError;
pub use id::{DocumentId, InvoiceId};
pub use value_object::ValueObject;
