use serde::Serialize;
use tracing::warn;

/// The three artifact families a request touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Artifact {
    Ledger,
    Variables,
    Topology,
}

impl Artifact {
    pub const ALL: [Artifact; 3] = [Artifact::Ledger, Artifact::Variables, Artifact::Topology];

    pub fn as_str(&self) -> &'static str {
        match self {
            Artifact::Ledger => "ledger",
            Artifact::Variables => "variables",
            Artifact::Topology => "topology",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal diagnostics. The reconciler has already degraded (appended at file end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReconcileWarning {
    MarkerNotFound { artifact: Artifact, marker: String },
}

impl ReconcileWarning {
    pub(crate) fn marker_not_found(artifact: Artifact, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        warn!(artifact = %artifact, marker = %marker, "structural marker not found; appending at end of file");
        ReconcileWarning::MarkerNotFound { artifact, marker }
    }
}

impl std::fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileWarning::MarkerNotFound { artifact, marker } => {
                write!(f, "{artifact}: marker '{marker}' not found, content appended at end of file")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A name or identity would break the artifact's syntax if written verbatim.
    UnsafeToken { artifact: Artifact, token: String },
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::UnsafeToken { artifact, token } => {
                write!(f, "{artifact}: refusing to write unsafe token '{token}'")
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

/// Result of one reconciliation call.
#[derive(Debug, Clone)]
pub struct Reconciled<R> {
    pub text: String,
    /// `text` differs from the input.
    pub changed: bool,
    pub report: R,
    pub warnings: Vec<ReconcileWarning>,
}

pub(crate) fn check_tokens<'a>(
    artifact: Artifact,
    tokens: impl IntoIterator<Item = &'a str>,
) -> Result<(), ReconcileError> {
    for token in tokens {
        let safe = !token.is_empty()
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');
        if !safe {
            return Err(ReconcileError::UnsafeToken {
                artifact,
                token: token.to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn request_tokens(req: &acmq_schemas::ChangeRequest) -> impl Iterator<Item = &str> {
    std::iter::once(req.name.as_str())
        .chain(req.producers().iter().map(String::as_str))
        .chain(req.consumers().iter().map(String::as_str))
        .chain(
            req.new_subscriptions()
                .flat_map(|s| [s.subscription_name.as_str(), s.subscriber.as_str()]),
        )
}
