//! Invoicing status tracking.
//!
//! When an invoice document is created, `PostCreateInvoiceTrigger` derives the
//! status documents that track it: a current-status summary, the statuses
//! history and the first immutable status record.

pub mod documents;
pub mod post_create;
pub mod status;

pub use documents::{
    CurrentStatusDocument, InvoiceRef, InvoiceStatusDocuments, StatusDocument, StatusesDocument,
};
pub use post_create::{POST_CREATE_INVOICE_HANDLER, POST_CREATE_INVOICE_TRIGGER_ID, PostCreateInvoiceTrigger};
pub use status::{Status, StatusState};
