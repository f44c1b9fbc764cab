use serde::{Deserialize, Serialize};

use statusdb_core::{Timestamp, ValueObject};

/// Invoice state recorded in a status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    /// Initial state of every freshly created invoice.
    Pending,
}

/// Point-in-time status snapshot, embedded in status documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub state: StatusState,
    pub created: Timestamp,
}

impl Status {
    pub fn pending(created: Timestamp) -> Self {
        Self {
            state: StatusState::Pending,
            created,
        }
    }
}

impl ValueObject for Status {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pending_status_wire_shape() {
        let created: Timestamp = "2024-05-06T07:08:09.010Z".parse().unwrap();
        assert_eq!(
            serde_json::to_value(Status::pending(created)).unwrap(),
            json!({ "state": "pending", "created": "2024-05-06T07:08:09.010Z" })
        );
    }
}
