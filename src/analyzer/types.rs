//! Data types produced by the diff analyzer.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inferred change operation for a resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Resource is being added.
    Create,
    /// Resource is being changed in place.
    #[default]
    Modify,
    /// Resource is being removed.
    Delete,
}

/// Infrastructure-as-code formats the analyzer understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IacFormat {
    /// Terraform (`.tf`, `.tfvars`).
    Terraform,
    /// Kubernetes manifests.
    Kubernetes,
    /// AWS `CloudFormation` templates (YAML or JSON).
    Cloudformation,
}

/// One changed resource located in a diff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceChange {
    /// Resource type (`aws_instance`, `Deployment`, `AWS::S3::Bucket`, `unknown`).
    #[serde(rename = "type", default = "default_resource_type")]
    pub resource_type: String,
    /// Resource name.
    #[serde(default = "default_resource_name")]
    pub name: String,
    /// Inferred operation.
    #[serde(default)]
    pub operation: Operation,
    /// Sorted, de-duplicated attribute names seen on changed lines.
    #[serde(default)]
    pub attributes_changed: Vec<String>,
    /// Diff excerpt around the resource.
    #[serde(default)]
    pub diff: String,
}

/// All resource changes found in one changed file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    /// Path of the changed file.
    pub file: String,
    /// Detected format.
    pub format: IacFormat,
    /// Resource changes; empty only when the diff was empty.
    #[serde(default)]
    pub resources: Vec<ResourceChange>,
}

/// Per-format file counts for an analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisSummary {
    /// Number of analyzed IaC files.
    pub total_files: usize,
    /// Number of Terraform files.
    pub terraform_files: usize,
    /// Number of Kubernetes files.
    pub kubernetes_files: usize,
    /// Number of `CloudFormation` files.
    pub cloudformation_files: usize,
}

/// Output of an analysis run, the input of classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Per-file changes.
    #[serde(default)]
    pub changes: Vec<FileChange>,
    /// File counts.
    #[serde(default)]
    pub summary: AnalysisSummary,
    /// Base revision compared.
    #[serde(default)]
    pub base_ref: String,
    /// Head revision compared.
    #[serde(default)]
    pub head_ref: String,
}

fn default_resource_type() -> String {
    String::from("unknown")
}

fn default_resource_name() -> String {
    String::from("unnamed")
}

/// `Kubernetes` content markers.
const K8S_INDICATORS: &[&str] = &["kind:", "apiVersion:"];

/// `CloudFormation` content markers, YAML and JSON spellings.
const CFN_INDICATORS: &[&str] = &[
    "AWSTemplateFormatVersion",
    "Resources:",
    "\"Resources\"",
];

impl Operation {
    /// Returns the lowercase operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IacFormat {
    /// Returns the lowercase format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Terraform => "terraform",
            Self::Kubernetes => "kubernetes",
            Self::Cloudformation => "cloudformation",
        }
    }

    /// Detects the format of a file from its path and, when available, the
    /// beginning of its content.
    ///
    /// Without content (or with empty content) a YAML file is assumed to be
    /// a Kubernetes manifest.
    #[must_use]
    pub fn detect(path: &str, head: Option<&str>) -> Option<Self> {
        let head = head.filter(|content| !content.is_empty());
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let is_yaml = matches!(extension, "yml" | "yaml");
        let has_any = |indicators: &[&str]| {
            head.is_none_or(|content| indicators.iter().any(|i| content.contains(i)))
        };

        if matches!(extension, "tf" | "tfvars") {
            return Some(Self::Terraform);
        }
        if is_yaml && has_any(K8S_INDICATORS) {
            return Some(Self::Kubernetes);
        }
        if (is_yaml || extension == "json") && has_any(CFN_INDICATORS) {
            return Some(Self::Cloudformation);
        }
        None
    }
}

impl std::fmt::Display for IacFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ResourceChange {
    /// Returns the `type.name` address of the resource.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

impl AnalysisSummary {
    /// Records one analyzed file of the given format.
    pub const fn record(&mut self, format: IacFormat) {
        self.total_files += 1;
        match format {
            IacFormat::Terraform => self.terraform_files += 1,
            IacFormat::Kubernetes => self.kubernetes_files += 1,
            IacFormat::Cloudformation => self.cloudformation_files += 1,
        }
    }
}

impl AnalysisReport {
    /// Returns the total number of resource changes across all files.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.changes.iter().map(|c| c.resources.len()).sum()
    }
}
