//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a document inside a collection (the wire-level primary key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

/// Identifier of an invoice, as carried in the `invoiceId` field of documents.
///
/// No format is imposed: whatever the invoice document carries is used verbatim
/// when deriving status document ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(String);

macro_rules! impl_string_newtype {
    ($t:ty) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_string_newtype!(DocumentId);
impl_string_newtype!(InvoiceId);

impl DocumentId {
    /// Build a document id, rejecting the empty string.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::invalid_id("DocumentId: must not be empty"));
        }
        Ok(Self(value))
    }

    /// Build a document id from parts that are known to produce a non-empty value.
    pub(crate) fn from_parts(parts: &[&str]) -> Self {
        Self(parts.concat())
    }
}

impl FromStr for DocumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl InvoiceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `<invoiceId>.test.currentStatus`
    pub fn current_status_document_id(&self) -> DocumentId {
        DocumentId::from_parts(&[&self.0, ".test.currentStatus"])
    }

    /// `<invoiceId>.test.statuses`
    pub fn statuses_document_id(&self) -> DocumentId {
        DocumentId::from_parts(&[&self.0, ".test.statuses"])
    }

    /// `<invoiceId>.test.status.<count>`
    pub fn status_document_id(&self, count: u64) -> DocumentId {
        DocumentId::from_parts(&[&self.0, ".test.status.", &count.to_string()])
    }
}

impl From<&str> for InvoiceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InvoiceId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
