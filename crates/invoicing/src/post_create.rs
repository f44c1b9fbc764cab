//! Post-create trigger for invoice documents.

use async_trait::async_trait;
use tracing::info;

use statusdb_events::{
    ChainOutcome, Trigger, TriggerContext, TriggerDefinition, TriggerError, TriggerOperation,
    TriggerType, WriteChain,
};

use crate::documents::{InvoiceRef, InvoiceStatusDocuments};

/// Id the trigger is registered under unless a collection definition says otherwise.
pub const POST_CREATE_INVOICE_TRIGGER_ID: &str = "triggerPostCreateInvoice";

/// Handler name collection definitions use to bind a trigger id to this handler.
pub const POST_CREATE_INVOICE_HANDLER: &str = "postCreateInvoice";

/// Creates the status documents of a freshly inserted invoice.
///
/// Writes, in this order and to the collection that received the invoice:
/// 1. `<invoiceId>.test.currentStatus`
/// 2. `<invoiceId>.test.status.0`
/// 3. `<invoiceId>.test.statuses`
///
/// A write the host does not admit ends the invocation quietly; a write that
/// fails ends it with an error. Earlier writes are kept either way.
#[derive(Debug, Clone)]
pub struct PostCreateInvoiceTrigger {
    definition: TriggerDefinition,
}

impl PostCreateInvoiceTrigger {
    pub fn new() -> Self {
        Self {
            definition: TriggerDefinition::new(
                POST_CREATE_INVOICE_TRIGGER_ID,
                TriggerType::Post,
                TriggerOperation::Create,
            ),
        }
    }
}

impl Default for PostCreateInvoiceTrigger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Trigger for PostCreateInvoiceTrigger {
    fn definition(&self) -> &TriggerDefinition {
        &self.definition
    }

    async fn run(&self, ctx: &mut TriggerContext<'_>) -> Result<ChainOutcome, TriggerError> {
        let invoice = InvoiceRef::from_document(ctx.body());
        let created = ctx.clock().now();
        let docs = InvoiceStatusDocuments::pending(&invoice, created);

        let outcome = WriteChain::new()
            .then(&docs.current)?
            .then(&docs.status)?
            .then(&docs.statuses)?
            .run(ctx.collection())
            .await?;

        info!(
            invoice_id = %invoice.key(),
            operation = ?ctx.operation(),
            created = %created,
            written = outcome.written().len(),
            completed = outcome.is_completed(),
            "invoice status documents created"
        );

        Ok(outcome)
    }
}
