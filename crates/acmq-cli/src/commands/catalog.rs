//! `acmq catalog`: read-only projection of a checkout.

use std::path::PathBuf;

use acmq_catalog::build_catalog;
use acmq_config::{ConfigConsumer, UnusedKeyPolicy};
use acmq_provision::Workspace;
use anyhow::{Context, Result};

use super::load_config;

pub fn run_catalog(root: PathBuf, config_paths: &[String]) -> Result<()> {
    let (_, cfg) = load_config(config_paths, ConfigConsumer::Catalog, UnusedKeyPolicy::Warn)?;
    let workspace = Workspace::new(root, cfg.artifacts.clone(), cfg.reconcile_settings());
    let texts = workspace.read_artifacts()?;

    let catalog = build_catalog(&texts.ledger, &texts.topology, &cfg.ledger_keys);
    println!("{}", catalog.to_json_pretty().context("serialize catalog")?);
    Ok(())
}
