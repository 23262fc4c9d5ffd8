//! `acmq provision`: one request against a checkout.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use acmq_config::{resolve_git_token, ConfigConsumer, UnusedKeyPolicy};
use acmq_provision::{ArtifactLocks, StatusStore, Workspace};
use acmq_schemas::ChangeRequest;
use anyhow::{Context, Result};
use tracing::info;

use super::load_config;

fn read_request(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("read request from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("read request: {source}"))
    }
}

pub fn run_provision(
    root: PathBuf,
    request_source: &str,
    config_paths: &[String],
    dry_run: bool,
    strict_config: bool,
) -> Result<()> {
    let policy = if strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let (loaded, cfg) = load_config(config_paths, ConfigConsumer::Provision, policy)?;

    let token = resolve_git_token(&cfg);
    info!(env = %token.env_name, present = token.is_present(), "git token");

    let request = ChangeRequest::from_json(&read_request(request_source)?)?;

    let workspace = Workspace::with_shared(
        root,
        cfg.artifacts.clone(),
        cfg.reconcile_settings(),
        Arc::new(ArtifactLocks::new()),
        Arc::new(StatusStore::new(cfg.status_retention)),
    );
    let outcome = workspace.provision(&request, dry_run)?;
    let plan = &outcome.plan;

    println!("request_id={}", outcome.request_id);
    println!("config_hash={}", loaded.config_hash);
    println!("resource={}", request.name);
    println!("change_kind={}", plan.summary.kind.label(request.resource_kind));
    println!("branch={}", plan.summary.branch_name());
    for change in plan.changed() {
        println!("changed_artifact={}", change.artifact);
    }
    for path in &outcome.written {
        println!("written={}", path.display());
    }
    for warning in plan.warnings() {
        println!("warning={warning}");
    }
    if plan.is_noop() {
        println!("noop=true");
    }
    if dry_run {
        println!("dry_run=true");
    }

    println!();
    println!("{}", plan.summary.title());
    println!();
    print!("{}", plan.summary.render());
    Ok(())
}
