//! acmq-provision
//!
//! Sequences the three reconcilers for one request and wraps them in the pieces a
//! caller needs around a pure engine:
//! - `provision`: validate, strip `admin`, ledger -> variables -> topology, summary
//! - `StatusStore`: request-id keyed outcomes with time-boxed retention
//! - `ArtifactLocks`: one in-flight reconciliation per artifact path
//! - `Workspace`: reads artifacts from a checkout, writes back only what changed
//!
//! Artifacts are reconciled independently. A failure part-way leaves earlier
//! artifacts' new text unapplied in memory; nothing is rolled back on disk because
//! nothing is written until every reconciler has succeeded.

mod error;
mod locks;
mod orchestrator;
mod status;
mod summary;
mod workspace;

pub use error::ProvisionError;
pub use locks::{lock_all, ArtifactLocks};
pub use orchestrator::{provision, strip_admin, ArtifactChange, ArtifactTexts, ProvisionPlan, ReconcileSettings};
pub use status::{StatusStore, DEFAULT_RETENTION_SECS};
pub use summary::{ChangeKind, ChangeSummary, SubscriberNote};
pub use workspace::{
    ArtifactPaths, Workspace, WorkspaceOutcome, DEFAULT_LEDGER_PATH, DEFAULT_TOPOLOGY_PATH, DEFAULT_VARIABLES_PATH,
};
