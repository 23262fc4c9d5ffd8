//! acmq-reconcile
//!
//! Reconciliation engine for the three broker provisioning artifacts:
//! - role ledger (hieradata YAML): users and permission groups
//! - variable declarations (Puppet class parameters and `validate_string` calls)
//! - topology (broker.xml ERB template): security settings and addresses
//!
//! Every reconciler is a function `text × request -> text` that parses the artifact
//! with a small line scanner, works out what is missing, and splices only the new or
//! rewritten lines back into the original text. Untouched lines are passed through
//! byte for byte, so reconciling an already-patched artifact is a no-op.
//!
//! Deterministic, pure logic. No IO. No locking: callers serialize access to a given
//! artifact.

pub mod ledger;
pub mod naming;
mod ordered;
mod outcome;
mod roles;
mod text;
pub mod topology;
pub mod variables;

pub use ledger::{reconcile_ledger, LedgerKeys, LedgerReport, RoleGroup, RoleLedger};
pub use naming::{display_name, namespace_prefix, normalize, NamespaceGroups, ResourceVars, ADMIN_IDENTITY};
pub use ordered::OrderedSet;
pub use outcome::{Artifact, ReconcileError, ReconcileWarning, Reconciled};
pub use roles::RoleList;
pub use topology::{reconcile_topology, TopologyDocument, TopologyOptions, TopologyReport};
pub use variables::{reconcile_variables, DeclarationBlock, VariableOptions, VariableReport};
