//! Whole-run analysis: walk a diff source and build an [`AnalysisReport`].

use tracing::{debug, info, warn};

use super::extract::DiffAnalyzer;
use super::heuristics::ChangeHeuristics;
use super::source::DiffSource;
use super::types::{AnalysisReport, AnalysisSummary, IacFormat};
use crate::error::Result;

impl<H: ChangeHeuristics> DiffAnalyzer<H> {
    /// Analyzes every IaC file changed in `source`.
    ///
    /// Files of unknown format and files whose diff is empty or cannot be
    /// read are skipped and do not count towards the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the list of changed files cannot be obtained.
    pub async fn analyze_source<S>(&self, source: &S) -> Result<AnalysisReport>
    where
        S: DiffSource + ?Sized,
    {
        info!(
            "Analyzing IaC changes: {}...{}",
            source.base_ref(),
            source.head_ref()
        );

        let changed_files = source.changed_files().await?;
        info!("Found {} changed files", changed_files.len());

        let mut changes = Vec::new();
        let mut summary = AnalysisSummary::default();

        for path in &changed_files {
            let head = source.file_head(path).await;
            let Some(format) = IacFormat::detect(path, head.as_deref()) else {
                debug!("Skipping non-IaC file: {path}");
                continue;
            };

            let diff = match source.file_diff(path).await {
                Ok(diff) if !diff.is_empty() => diff,
                Ok(_) => {
                    debug!("Empty diff for {path}, skipping");
                    continue;
                }
                Err(e) => {
                    warn!("Could not get diff for {path}: {e}");
                    continue;
                }
            };

            info!("  {path} ({format})");
            changes.push(self.analyze(format, path, &diff));
            summary.record(format);
        }

        info!(
            "Analysis summary: {} IaC files ({} terraform, {} kubernetes, {} cloudformation)",
            summary.total_files,
            summary.terraform_files,
            summary.kubernetes_files,
            summary.cloudformation_files
        );

        Ok(AnalysisReport {
            changes,
            summary,
            base_ref: source.base_ref().to_string(),
            head_ref: source.head_ref().to_string(),
        })
    }
}
