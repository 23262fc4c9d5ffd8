use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use acmq_reconcile::Artifact;
use acmq_schemas::{ChangeRequest, ProvisionState};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ProvisionError;
use crate::locks::{lock_all, ArtifactLocks};
use crate::orchestrator::{provision, ArtifactTexts, ProvisionPlan, ReconcileSettings};
use crate::status::StatusStore;

pub const DEFAULT_LEDGER_PATH: &str = "hieradata/role/acmq.yaml";
pub const DEFAULT_VARIABLES_PATH: &str = "puppet/modules/icc_artemis_broker/manifests/init.pp";
pub const DEFAULT_TOPOLOGY_PATH: &str = "puppet/modules/icc_artemis_broker/templates/brokers/etc/broker.xml.erb";

/// Locations of the three artifacts, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub ledger: PathBuf,
    pub variables: PathBuf,
    pub topology: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            ledger: PathBuf::from(DEFAULT_LEDGER_PATH),
            variables: PathBuf::from(DEFAULT_VARIABLES_PATH),
            topology: PathBuf::from(DEFAULT_TOPOLOGY_PATH),
        }
    }
}

impl ArtifactPaths {
    pub fn get(&self, artifact: Artifact) -> &Path {
        match artifact {
            Artifact::Ledger => &self.ledger,
            Artifact::Variables => &self.variables,
            Artifact::Topology => &self.topology,
        }
    }
}

#[derive(Debug)]
pub struct WorkspaceOutcome {
    pub request_id: Uuid,
    pub plan: ProvisionPlan,
    /// Files written, in reconcile order. Empty on a dry run or a no-op.
    pub written: Vec<PathBuf>,
}

/// A checkout holding the three artifacts.
///
/// Every provisioning cycle holds the locks of all three artifact paths from read to
/// write-back, so concurrent requests against the same checkout serialize.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    paths: ArtifactPaths,
    settings: ReconcileSettings,
    locks: Arc<ArtifactLocks>,
    status: Arc<StatusStore>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, paths: ArtifactPaths, settings: ReconcileSettings) -> Self {
        Self::with_shared(
            root,
            paths,
            settings,
            Arc::new(ArtifactLocks::new()),
            Arc::new(StatusStore::default()),
        )
    }

    pub fn with_shared(
        root: impl Into<PathBuf>,
        paths: ArtifactPaths,
        settings: ReconcileSettings,
        locks: Arc<ArtifactLocks>,
        status: Arc<StatusStore>,
    ) -> Self {
        Self {
            root: root.into(),
            paths,
            settings,
            locks,
            status,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn status(&self) -> &StatusStore {
        &self.status
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.root.join(self.paths.get(artifact))
    }

    pub fn read_artifacts(&self) -> Result<ArtifactTexts, ProvisionError> {
        Ok(ArtifactTexts {
            ledger: self.read(Artifact::Ledger)?,
            variables: self.read(Artifact::Variables)?,
            topology: self.read(Artifact::Topology)?,
        })
    }

    fn read(&self, artifact: Artifact) -> Result<String, ProvisionError> {
        let path = self.path(artifact);
        fs::read_to_string(&path).map_err(|source| ProvisionError::Io { path, source })
    }

    /// Read, reconcile and write back changed artifacts.
    ///
    /// The outcome is recorded in the status store under a fresh request id whether
    /// the cycle succeeds or fails. Entries past retention are dropped first.
    pub fn provision(&self, request: &ChangeRequest, dry_run: bool) -> Result<WorkspaceOutcome, ProvisionError> {
        let now = Utc::now();
        self.status.purge_expired(now);
        let request_id = self.status.begin(now);
        match self.run(request, dry_run) {
            Ok((plan, written)) => {
                let (state, message) = if plan.is_noop() {
                    (ProvisionState::NoChange, "artifacts already up to date".to_string())
                } else {
                    (ProvisionState::Succeeded, plan.summary.title())
                };
                let changed = plan.changed().map(|c| c.artifact.as_str().to_string()).collect();
                self.status.finish(request_id, state, message, changed, Utc::now());
                Ok(WorkspaceOutcome {
                    request_id,
                    plan,
                    written,
                })
            }
            Err(err) => {
                warn!(request_id = %request_id, error = %err, "provisioning failed");
                self.status
                    .finish(request_id, ProvisionState::Failed, err.to_string(), Vec::new(), Utc::now());
                Err(err)
            }
        }
    }

    fn run(&self, request: &ChangeRequest, dry_run: bool) -> Result<(ProvisionPlan, Vec<PathBuf>), ProvisionError> {
        let keys: Vec<String> = Artifact::ALL
            .iter()
            .map(|a| self.path(*a).to_string_lossy().into_owned())
            .collect();
        let handles = self.locks.handles(&keys);
        let _guards = lock_all(&handles);

        let current = self.read_artifacts()?;
        let plan = provision(request, &current, &self.settings)?;

        let mut written = Vec::new();
        if dry_run {
            info!(resource = %request.name, "dry run; no files written");
            return Ok((plan, written));
        }
        for change in plan.changed() {
            let path = self.path(change.artifact);
            fs::write(&path, &change.text).map_err(|source| ProvisionError::Io {
                path: path.clone(),
                source,
            })?;
            info!(artifact = %change.artifact, path = %path.display(), "artifact written");
            written.push(path);
        }
        Ok((plan, written))
    }
}
