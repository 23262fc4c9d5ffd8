use std::path::PathBuf;

use acmq_reconcile::{Artifact, ReconcileError};
use acmq_schemas::ValidationError;

#[derive(Debug)]
pub enum ProvisionError {
    /// The request itself is wrong; the caller can fix and resubmit.
    Validation(ValidationError),
    Reconcile { artifact: Artifact, source: ReconcileError },
    Io { path: PathBuf, source: std::io::Error },
}

impl ProvisionError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ProvisionError::Validation(_))
    }
}

impl std::fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionError::Validation(e) => write!(f, "invalid request: {e}"),
            ProvisionError::Reconcile { artifact, source } => {
                write!(f, "reconciling {artifact} failed: {source}")
            }
            ProvisionError::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ProvisionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProvisionError::Validation(e) => Some(e),
            ProvisionError::Reconcile { source, .. } => Some(source),
            ProvisionError::Io { source, .. } => Some(source),
        }
    }
}

impl From<ValidationError> for ProvisionError {
    fn from(e: ValidationError) -> Self {
        ProvisionError::Validation(e)
    }
}
