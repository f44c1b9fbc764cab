use thiserror::Error;

use statusdb_events::{TriggerError, WriteError};

/// Failure of a host-level operation (document create with triggers, trigger registration).
#[derive(Debug, Error)]
pub enum HostError {
    /// The triggering write itself failed.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// A request named a trigger that is not registered.
    #[error("trigger '{0}' is not registered")]
    UnknownTrigger(String),

    /// A request named a trigger whose type or operation does not fit the write.
    #[error("trigger '{id}' cannot run here: {reason}")]
    TriggerMismatch { id: String, reason: String },

    /// A trigger with the same id is already registered.
    #[error("trigger '{0}' is already registered")]
    DuplicateTrigger(String),

    /// A trigger invocation failed.
    #[error("trigger '{id}' failed: {source}")]
    Trigger {
        id: String,
        #[source]
        source: TriggerError,
    },

    /// Internal state is unusable (e.g. poisoned lock).
    #[error("host unavailable: {0}")]
    Unavailable(String),
}
