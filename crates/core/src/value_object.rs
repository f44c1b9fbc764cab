//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. A status snapshot embedded in several documents is the
//! canonical example here: the copies are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Status {
///     state: StatusState,
///     created: Timestamp,
/// }
///
/// impl ValueObject for Status {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
