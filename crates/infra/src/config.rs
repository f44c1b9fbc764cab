//! Host configuration from environment variables.

use std::path::PathBuf;

use thiserror::Error;

use statusdb_events::CollectionLink;
use statusdb_observability::{LogFormat, LogFormatError};

use crate::collection::{BudgetPolicy, DEFAULT_MAX_DOCUMENT_BYTES};

pub const ENV_DATABASE: &str = "STATUSDB_DATABASE";
pub const ENV_COLLECTION: &str = "STATUSDB_COLLECTION";
pub const ENV_REQUEST_BUDGET: &str = "STATUSDB_REQUEST_BUDGET";
pub const ENV_CREATE_CHARGE: &str = "STATUSDB_CREATE_CHARGE";
pub const ENV_MAX_DOCUMENT_BYTES: &str = "STATUSDB_MAX_DOCUMENT_BYTES";
pub const ENV_DEFINITIONS: &str = "STATUSDB_DEFINITIONS";
pub const ENV_LOG_FORMAT: &str = "STATUSDB_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error(transparent)]
    LogFormat(#[from] LogFormatError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Trigger bodies given as script source cannot run in this host.
    #[error("trigger '{id}' uses source location '{location}'; only builtin handlers are supported")]
    UnsupportedSource { id: String, location: String },

    #[error("trigger '{id}' names unknown handler '{handler}'")]
    UnknownHandler { id: String, handler: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub database_id: String,
    pub collection_id: String,
    pub budget: BudgetPolicy,
    pub max_document_bytes: usize,
    /// Collection definitions file, if any.
    pub definitions: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            database_id: "invoicing".to_string(),
            collection_id: "invoices".to_string(),
            budget: BudgetPolicy::default(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            definitions: None,
            log_format: LogFormat::default(),
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or empty variables keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let budget = BudgetPolicy::new(
            number(ENV_REQUEST_BUDGET, get(ENV_REQUEST_BUDGET))?
                .unwrap_or(defaults.budget.request_units),
            number(ENV_CREATE_CHARGE, get(ENV_CREATE_CHARGE))?
                .unwrap_or(defaults.budget.create_base_charge),
        );
        let max_document_bytes = match number(ENV_MAX_DOCUMENT_BYTES, get(ENV_MAX_DOCUMENT_BYTES))? {
            Some(n) => usize::try_from(n).map_err(|_| ConfigError::InvalidNumber {
                var: ENV_MAX_DOCUMENT_BYTES,
                value: n.to_string(),
            })?,
            None => defaults.max_document_bytes,
        };
        let log_format = match get(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        Ok(Self {
            database_id: get(ENV_DATABASE).unwrap_or(defaults.database_id),
            collection_id: get(ENV_COLLECTION).unwrap_or(defaults.collection_id),
            budget,
            max_document_bytes,
            definitions: get(ENV_DEFINITIONS).map(PathBuf::from),
            log_format,
        })
    }

    pub fn collection_link(&self) -> CollectionLink {
        CollectionLink::new(self.database_id.clone(), self.collection_id.clone())
    }
}

fn number(var: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var, value })
    })
    .transpose()
}
