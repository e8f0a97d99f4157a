//! Diff sources.
//!
//! A [`DiffSource`] lists the files changed between two revisions and hands
//! out their unified diffs. [`GitDiffSource`] shells out to `git`; tests use
//! in-memory sources.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// Bytes of file content read for format detection.
pub const DETECTION_HEAD_BYTES: usize = 1024;

/// Trait for diff providers.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Base revision being compared.
    fn base_ref(&self) -> &str;

    /// Head revision being compared.
    fn head_ref(&self) -> &str;

    /// Lists the paths of all changed files.
    async fn changed_files(&self) -> Result<Vec<String>>;

    /// Returns the unified diff of a single file.
    async fn file_diff(&self, path: &str) -> Result<String>;

    /// Returns the beginning of the file's current content, if readable.
    async fn file_head(&self, path: &str) -> Option<String>;
}

/// Diff source backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitDiffSource {
    repo_dir: PathBuf,
    base_ref: String,
    head_ref: String,
}

impl GitDiffSource {
    /// Creates a source comparing `base_ref` to `head_ref` in the current
    /// directory.
    #[must_use]
    pub fn new(base_ref: impl Into<String>, head_ref: impl Into<String>) -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            base_ref: base_ref.into(),
            head_ref: head_ref.into(),
        }
    }

    /// Sets the repository working directory.
    #[must_use]
    pub fn with_repo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = dir.into();
        self
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        debug!("Running git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|e| AnalysisError::GitFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AnalysisError::GitFailed {
                command: args.join(" "),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DiffSource for GitDiffSource {
    fn base_ref(&self) -> &str {
        &self.base_ref
    }

    fn head_ref(&self) -> &str {
        &self.head_ref
    }

    async fn changed_files(&self) -> Result<Vec<String>> {
        let stdout = self
            .git(&["diff", "--name-only", &self.base_ref, &self.head_ref])
            .await?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    async fn file_diff(&self, path: &str) -> Result<String> {
        self.git(&["diff", &self.base_ref, &self.head_ref, "--", path])
            .await
    }

    async fn file_head(&self, path: &str) -> Option<String> {
        let bytes = tokio::fs::read(self.repo_dir.join(path)).await.ok()?;
        let head = &bytes[..bytes.len().min(DETECTION_HEAD_BYTES)];
        Some(String::from_utf8_lossy(head).into_owned())
    }
}
