//! Report files exchanged between CLI stages.

use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::analyzer::AnalysisReport;
use crate::error::{AnalysisError, Result};

/// Reads an analysis report written by `analyze`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an analysis report.
pub async fn read_analysis(path: &Path) -> Result<AnalysisReport> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AnalysisError::InvalidInput {
            message: format!("cannot read {}: {e}", path.display()),
        })?;

    let report: AnalysisReport =
        serde_json::from_str(&content).map_err(|e| AnalysisError::InvalidInput {
            message: format!("{}: {e}", path.display()),
        })?;

    info!(
        "Loaded analysis of {} files from {}",
        report.changes.len(),
        path.display()
    );
    Ok(report)
}

/// Writes `value` as pretty JSON, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem operation fails.
pub async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    info!("Wrote {}", path.display());
    Ok(())
}
