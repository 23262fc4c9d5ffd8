//! Command handler modules for acmq-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod catalog;
pub mod provision;

use acmq_config::{
    load_layered_yaml, report_unused_keys, ConfigConsumer, LoadedConfig, ProvisionerConfig, UnusedKeyPolicy,
};
use acmq_reconcile::{normalize, NamespaceGroups};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Load layered config (or the all-defaults config when no path is given) and check
/// it against what `consumer` reads.
pub fn load_config(
    config_paths: &[String],
    consumer: ConfigConsumer,
    policy: UnusedKeyPolicy,
) -> Result<(LoadedConfig, ProvisionerConfig)> {
    let loaded = if config_paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        load_layered_yaml(config_paths)?
    };

    let report = report_unused_keys(consumer, &loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            consumer = consumer.as_str(),
            unused = report.unused_leaf_pointers.len(),
            "CONFIG_UNUSED_KEYS"
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            warn!(pointer = %p, "unused config key");
        }
    }

    let cfg = ProvisionerConfig::from_config_json(&loaded.config_json).context("invalid provisioner config")?;
    info!(config_hash = %loaded.config_hash, "config loaded");
    Ok((loaded, cfg))
}

pub fn validate_name(name: &str) -> Result<()> {
    acmq_schemas::validate_resource_name(name)?;
    let groups = NamespaceGroups::for_resource(name);
    println!("identifier={}", normalize(name));
    println!("namespace={}", groups.prefix);
    println!("admin_group={}", groups.admin);
    println!("read_group={}", groups.read);
    println!("write_group={}", groups.write);
    Ok(())
}
