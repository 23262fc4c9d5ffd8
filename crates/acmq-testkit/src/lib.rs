//! Shared fixtures and helpers for the provisioning scenario tests.

pub mod fixtures;
mod request;

pub use request::RequestBuilder;

use std::fs;
use std::path::Path;

use acmq_provision::{ArtifactPaths, ArtifactTexts, ReconcileSettings, Workspace};
use acmq_reconcile::Artifact;
use anyhow::{Context, Result};
use tempfile::TempDir;

/// Write `texts` into `root` at `paths`, creating parent directories.
pub fn write_artifacts(root: &Path, paths: &ArtifactPaths, texts: &ArtifactTexts) -> Result<()> {
    for artifact in Artifact::ALL {
        let path = root.join(paths.get(artifact));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
        }
        fs::write(&path, texts.get(artifact)).with_context(|| format!("write artifact: {}", path.display()))?;
    }
    Ok(())
}

/// A temporary checkout holding the given artifacts at the default paths.
pub struct SeededWorkspace {
    pub dir: TempDir,
    pub workspace: Workspace,
}

impl SeededWorkspace {
    pub fn read(&self, artifact: Artifact) -> Result<String> {
        let path = self.workspace.path(artifact);
        fs::read_to_string(&path).with_context(|| format!("read artifact: {}", path.display()))
    }
}

pub fn seed_workspace(texts: &ArtifactTexts) -> Result<SeededWorkspace> {
    let dir = tempfile::tempdir().context("create temp workspace")?;
    let paths = ArtifactPaths::default();
    write_artifacts(dir.path(), &paths, texts)?;
    let workspace = Workspace::new(dir.path(), paths, ReconcileSettings::default());
    Ok(SeededWorkspace { dir, workspace })
}
