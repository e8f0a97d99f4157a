//! IaC diff analysis.
//!
//! This module turns unified diffs into structured resource changes:
//! - Format detection for Terraform, Kubernetes and `CloudFormation` files
//! - Per-format resource extraction with window heuristics for operation,
//!   changed attributes and diff excerpt
//! - Diff sources (`git` or in-memory) and whole-run reports

mod extract;
mod heuristics;
mod report;
mod source;
mod types;

pub use extract::{DiffAnalyzer, GENERIC_DIFF_MAX_CHARS};
pub use heuristics::{
    ATTRIBUTE_RADIUS, ChangeHeuristics, OPERATION_RADIUS, SNIPPET_MAX_LINES, SNIPPET_RADIUS,
    WindowHeuristics, truncate_chars, window,
};
pub use source::{DETECTION_HEAD_BYTES, DiffSource, GitDiffSource};
pub use types::{
    AnalysisReport, AnalysisSummary, FileChange, IacFormat, Operation, ResourceChange,
};
