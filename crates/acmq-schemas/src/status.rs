use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionState {
    Pending,
    Succeeded,
    /// Every artifact already matched the request; nothing was published.
    NoChange,
    Failed,
}

/// Outcome of one provisioning request, keyed by `request_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionStatus {
    pub request_id: Uuid,
    pub state: ProvisionState,
    pub message: String,
    #[serde(default)]
    pub changed_artifacts: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ProvisionStatus {
    pub fn pending(request_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            request_id,
            state: ProvisionState::Pending,
            message: "provisioning in progress".to_string(),
            changed_artifacts: Vec::new(),
            recorded_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state != ProvisionState::Pending
    }
}
