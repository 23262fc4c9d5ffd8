use std::path::PathBuf;

use acmq_provision::{
    ArtifactPaths, ReconcileSettings, DEFAULT_LEDGER_PATH, DEFAULT_RETENTION_SECS, DEFAULT_TOPOLOGY_PATH,
    DEFAULT_VARIABLES_PATH,
};
use acmq_reconcile::ledger::{DEFAULT_ROLES_KEY, DEFAULT_USERS_KEY};
use acmq_reconcile::variables::DEFAULT_ALIGNMENT_COLUMN;
use acmq_reconcile::{LedgerKeys, TopologyOptions, VariableOptions};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::secrets::DEFAULT_GIT_TOKEN_ENV;

/// Typed view of the effective config. Every key is optional; absent keys take the
/// defaults of the broker repositories the provisioner was built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    pub artifacts: ArtifactPaths,
    pub ledger_keys: LedgerKeys,
    pub default_alignment_column: usize,
    pub merge_subscriber_into_resource_scope: bool,
    pub status_retention: chrono::Duration,
    /// Env var NAME holding the git token.
    pub git_token_env: String,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactPaths::default(),
            ledger_keys: LedgerKeys::default(),
            default_alignment_column: DEFAULT_ALIGNMENT_COLUMN,
            merge_subscriber_into_resource_scope: true,
            status_retention: chrono::Duration::seconds(DEFAULT_RETENTION_SECS),
            git_token_env: DEFAULT_GIT_TOKEN_ENV.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    artifacts: RawArtifacts,
    ledger: RawLedger,
    variables: RawVariables,
    topology: RawTopology,
    status: RawStatus,
    git: RawGit,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArtifacts {
    ledger: Option<String>,
    variables: Option<String>,
    topology: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLedger {
    users_key: Option<String>,
    roles_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVariables {
    default_alignment_column: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTopology {
    merge_subscriber_into_resource_scope: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStatus {
    retention_secs: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGit {
    token_env: Option<String>,
}

fn non_blank(v: Option<String>, field: &str) -> Result<Option<String>> {
    match v {
        Some(s) if s.trim().is_empty() => bail!("CONFIG_INVALID {field} must not be blank"),
        Some(s) => Ok(Some(s.trim().to_string())),
        None => Ok(None),
    }
}

impl ProvisionerConfig {
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_value(config_json.clone()).context("config does not match provisioner schema")?;
        let defaults = Self::default();

        let path = |v: Option<String>, field: &str, fallback: &str| -> Result<PathBuf> {
            Ok(PathBuf::from(non_blank(v, field)?.unwrap_or_else(|| fallback.to_string())))
        };
        let artifacts = ArtifactPaths {
            ledger: path(raw.artifacts.ledger, "artifacts.ledger", DEFAULT_LEDGER_PATH)?,
            variables: path(raw.artifacts.variables, "artifacts.variables", DEFAULT_VARIABLES_PATH)?,
            topology: path(raw.artifacts.topology, "artifacts.topology", DEFAULT_TOPOLOGY_PATH)?,
        };

        let ledger_keys = LedgerKeys {
            users_key: non_blank(raw.ledger.users_key, "ledger.users_key")?
                .unwrap_or_else(|| DEFAULT_USERS_KEY.to_string()),
            roles_key: non_blank(raw.ledger.roles_key, "ledger.roles_key")?
                .unwrap_or_else(|| DEFAULT_ROLES_KEY.to_string()),
        };

        let default_alignment_column = raw
            .variables
            .default_alignment_column
            .unwrap_or(defaults.default_alignment_column);
        if default_alignment_column == 0 {
            bail!("CONFIG_INVALID variables.default_alignment_column must be positive");
        }

        let status_retention = match raw.status.retention_secs {
            Some(secs) if secs <= 0 => bail!("CONFIG_INVALID status.retention_secs must be positive"),
            Some(secs) => chrono::Duration::seconds(secs),
            None => defaults.status_retention,
        };

        Ok(Self {
            artifacts,
            ledger_keys,
            default_alignment_column,
            merge_subscriber_into_resource_scope: raw
                .topology
                .merge_subscriber_into_resource_scope
                .unwrap_or(defaults.merge_subscriber_into_resource_scope),
            status_retention,
            git_token_env: non_blank(raw.git.token_env, "git.token_env")?.unwrap_or(defaults.git_token_env),
        })
    }

    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            ledger_keys: self.ledger_keys.clone(),
            variables: VariableOptions {
                default_alignment_column: self.default_alignment_column,
            },
            topology: TopologyOptions {
                merge_subscriber_into_resource_scope: self.merge_subscriber_into_resource_scope,
            },
        }
    }
}
