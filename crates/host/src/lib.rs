//! Local trigger host: loads invoice documents from files, creates them in an
//! in-memory collection with the post-create triggers attached, and returns
//! the resulting collection contents.

use std::path::Path;

use anyhow::{Context, bail};
use serde_json::Value as JsonValue;
use tracing::info;

use statusdb_events::{TriggerOperation, TriggerType};
use statusdb_infra::definitions::{self, Registration};
use statusdb_infra::{CreateDocumentOptions, HostConfig, TriggerHost};

/// Host for the configured collection with its triggers installed.
pub fn build_host(config: &HostConfig) -> anyhow::Result<TriggerHost> {
    let registrations: Vec<Registration> = match &config.definitions {
        Some(path) => {
            let defs = definitions::load(path)?;
            definitions::registrations_for(&defs, &config.collection_link())?
        }
        None => definitions::default_registrations(),
    };

    let host = TriggerHost::from_config(config);
    definitions::install(host.registry(), registrations)
        .context("failed to install triggers")?;
    info!(
        collection = %host.collection().link(),
        triggers = host.registry().list().len(),
        "trigger host ready"
    );
    Ok(host)
}

/// Invoice documents in `raw`: a single JSON object or an array of objects.
pub fn parse_invoices(raw: &str) -> anyhow::Result<Vec<JsonValue>> {
    let value: JsonValue = serde_json::from_str(raw).context("invalid JSON")?;
    let docs = match value {
        JsonValue::Object(_) => vec![value],
        JsonValue::Array(items) => items,
        other => bail!("expected an object or an array of objects, got {other}"),
    };
    if let Some(pos) = docs.iter().position(|d| !d.is_object()) {
        bail!("element {pos} is not a JSON object");
    }
    Ok(docs)
}

pub fn read_invoices(path: &Path) -> anyhow::Result<Vec<JsonValue>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_invoices(&raw).with_context(|| format!("failed to load invoices from {}", path.display()))
}

/// Create options naming every registered post-trigger that fires on create.
pub fn invoice_create_options(host: &TriggerHost) -> CreateDocumentOptions {
    host.registry()
        .list()
        .into_iter()
        .filter(|d| {
            d.trigger_type == TriggerType::Post
                && d.trigger_operation.applies_to(TriggerOperation::Create)
        })
        .fold(CreateDocumentOptions::new(), |opts, d| opts.with_post_trigger(d.id))
}

/// Create `invoices` in order; stops at the first failure.
pub async fn create_invoices(host: &TriggerHost, invoices: Vec<JsonValue>) -> anyhow::Result<()> {
    let options = invoice_create_options(host);
    for (index, invoice) in invoices.into_iter().enumerate() {
        host.create_document(invoice, &options)
            .await
            .with_context(|| format!("invoice #{index} could not be created"))?;
    }
    Ok(())
}

/// Load every file, create its invoices and return the collection as JSON (ordered by id).
pub async fn run<P: AsRef<Path>>(config: &HostConfig, paths: &[P]) -> anyhow::Result<Vec<JsonValue>> {
    let host = build_host(config)?;
    for path in paths {
        let invoices = read_invoices(path.as_ref())?;
        create_invoices(&host, invoices).await?;
    }
    Ok(host.collection().list().iter().map(|d| d.to_json()).collect())
}
