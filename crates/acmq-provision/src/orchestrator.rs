use acmq_reconcile::{
    reconcile_ledger, reconcile_topology, reconcile_variables, Artifact, LedgerKeys, LedgerReport, ReconcileError,
    ReconcileWarning, Reconciled, RoleLedger, TopologyOptions, TopologyReport, VariableOptions, VariableReport,
    ADMIN_IDENTITY,
};
use acmq_schemas::ChangeRequest;
use tracing::{debug, info};

use crate::error::ProvisionError;
use crate::summary::ChangeSummary;

/// Current text of the three artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactTexts {
    pub ledger: String,
    pub variables: String,
    pub topology: String,
}

impl ArtifactTexts {
    pub fn get(&self, artifact: Artifact) -> &str {
        match artifact {
            Artifact::Ledger => &self.ledger,
            Artifact::Variables => &self.variables,
            Artifact::Topology => &self.topology,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub ledger_keys: LedgerKeys,
    pub variables: VariableOptions,
    pub topology: TopologyOptions,
}

#[derive(Debug, Clone)]
pub struct ArtifactChange {
    pub artifact: Artifact,
    pub text: String,
    pub changed: bool,
    pub warnings: Vec<ReconcileWarning>,
}

#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    /// Ledger, variables, topology, in that order.
    pub changes: Vec<ArtifactChange>,
    pub summary: ChangeSummary,
    pub ledger: LedgerReport,
    pub variables: VariableReport,
    pub topology: TopologyReport,
}

impl ProvisionPlan {
    /// No artifact changed; nothing should be published.
    pub fn is_noop(&self) -> bool {
        self.changes.iter().all(|c| !c.changed)
    }

    /// Artifacts whose text changed, in reconcile order.
    pub fn changed(&self) -> impl Iterator<Item = &ArtifactChange> {
        self.changes.iter().filter(|c| c.changed)
    }

    pub fn change(&self, artifact: Artifact) -> Option<&ArtifactChange> {
        self.changes.iter().find(|c| c.artifact == artifact)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ReconcileWarning> {
        self.changes.iter().flat_map(|c| c.warnings.iter())
    }
}

/// Remove the literal `admin` identity (any case) from producers and consumers.
/// Returns how many entries were removed.
pub fn strip_admin(req: &mut ChangeRequest) -> usize {
    let mut removed = 0;
    for list in [req.producers.as_mut(), req.consumers.as_mut()].into_iter().flatten() {
        let before = list.len();
        list.retain(|id| !id.eq_ignore_ascii_case(ADMIN_IDENTITY));
        removed += before - list.len();
    }
    removed
}

fn stage<R>(
    artifact: Artifact,
    result: Result<Reconciled<R>, ReconcileError>,
) -> Result<(ArtifactChange, R), ProvisionError> {
    let done = result.map_err(|source| ProvisionError::Reconcile { artifact, source })?;
    debug!(artifact = %artifact, changed = done.changed, "reconciled");
    Ok((
        ArtifactChange {
            artifact,
            text: done.text,
            changed: done.changed,
            warnings: done.warnings,
        },
        done.report,
    ))
}

/// Reconcile all three artifacts for `request`.
///
/// The request is validated first. Any reconciler failure aborts the whole request
/// and names the artifact it came from.
pub fn provision(
    request: &ChangeRequest,
    current: &ArtifactTexts,
    settings: &ReconcileSettings,
) -> Result<ProvisionPlan, ProvisionError> {
    request.validate()?;

    let mut req = request.clone();
    let stripped = strip_admin(&mut req);
    if stripped > 0 {
        info!(stripped, "admin identity removed from request; admin access is implicit");
    }

    let known = RoleLedger::parse(&current.ledger, &settings.ledger_keys);

    let (ledger, ledger_report) = stage(
        Artifact::Ledger,
        reconcile_ledger(&current.ledger, &req, &settings.ledger_keys),
    )?;
    if !ledger.changed {
        info!(resource = %req.name, "ledger already up to date; no ledger patch");
    }

    let (variables, variables_report) = stage(
        Artifact::Variables,
        reconcile_variables(&current.variables, &req, &settings.variables),
    )?;
    let (topology, topology_report) = stage(
        Artifact::Topology,
        reconcile_topology(&current.topology, &req, &settings.topology),
    )?;

    let summary = ChangeSummary::build(&req, &known, &topology_report);
    let plan = ProvisionPlan {
        changes: vec![ledger, variables, topology],
        summary,
        ledger: ledger_report,
        variables: variables_report,
        topology: topology_report,
    };

    info!(
        resource = %req.name,
        kind = %plan.summary.kind.label(req.resource_kind),
        changed = plan.changed().count(),
        "provisioning plan ready"
    );
    Ok(plan)
}
