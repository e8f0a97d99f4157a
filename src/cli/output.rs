//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::analyzer::AnalysisReport;
use crate::classifier::{Category, CategorySummary, ClassificationReport};
use crate::config::{ConfigHasher, ScnConfig, ValidationResult};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Classification row for table display.
#[derive(Tabled)]
struct ClassificationRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Reasoning")]
    reasoning: String,
}

/// Analyzed resource row for table display.
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Attributes")]
    attributes: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats an analysis report summary.
    #[must_use]
    pub fn format_analysis(&self, report: &AnalysisReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(&AnalysisJson::from(report)),
            OutputFormat::Text => Self::format_analysis_text(report),
        }
    }

    fn format_analysis_text(report: &AnalysisReport) -> String {
        let mut output = String::new();
        let _ = write!(
            output,
            "\nIaC changes {}..{}\n\n",
            report.base_ref, report.head_ref
        );

        if report.changes.is_empty() {
            output.push_str("   No infrastructure changes detected.\n");
            return output;
        }

        let rows: Vec<ResourceRow> = report
            .changes
            .iter()
            .flat_map(|file| {
                file.resources.iter().map(|r| ResourceRow {
                    file: truncate(&file.file, 40),
                    format: file.format.to_string(),
                    resource: truncate(&r.address(), 40),
                    operation: r.operation.to_string(),
                    attributes: truncate(&r.attributes_changed.join(", "), 40),
                })
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let summary = &report.summary;
        let _ = writeln!(
            output,
            "\nFiles: {} ({} terraform, {} kubernetes, {} cloudformation), {} resources",
            summary.total_files,
            summary.terraform_files,
            summary.kubernetes_files,
            summary.cloudformation_files,
            report.resource_count()
        );

        output
    }

    /// Formats a classification report summary with notification guidance.
    #[must_use]
    pub fn format_classification(&self, report: &ClassificationReport, config: &ScnConfig) -> String {
        match self.format {
            OutputFormat::Json => to_json(&ClassificationJson::from(report)),
            OutputFormat::Text => Self::format_classification_text(report, config),
        }
    }

    fn format_classification_text(report: &ClassificationReport, config: &ScnConfig) -> String {
        let mut output = String::new();

        let _ = write!(
            output,
            "\nSCN classification ({})\n",
            config.compliance_framework.as_deref().unwrap_or("FedRAMP")
        );
        let _ = write!(
            output,
            "   Config: v{} ({})  AI fallback: {}\n\n",
            report.config_version,
            ConfigHasher::short_hash(&report.config_hash),
            if report.ai_enabled { "enabled" } else { "disabled" }
        );

        if report.classifications.is_empty() {
            output.push_str("   No changes to classify.\n");
            return output;
        }

        let rows: Vec<ClassificationRow> = report
            .classifications
            .iter()
            .map(|c| ClassificationRow {
                file: truncate(&c.file, 30),
                resource: truncate(&c.resource, 40),
                category: format_category(c.classification.category),
                method: c.classification.method.to_string(),
                confidence: format!("{:.2}", c.classification.confidence),
                reasoning: truncate(&c.classification.reasoning, 50),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let summary = &report.summary;
        let _ = writeln!(
            output,
            "\nSummary: {} routine, {} adaptive, {} transformative, {} impact, {} manual review",
            summary.routine.to_string().green(),
            summary.adaptive.to_string().cyan(),
            summary.transformative.to_string().yellow(),
            summary.impact.to_string().red(),
            summary.manual_review.to_string().magenta()
        );

        Self::write_notifications(&mut output, summary, config);
        output
    }

    fn write_notifications(output: &mut String, summary: &CategorySummary, config: &ScnConfig) {
        let pending: Vec<Category> = Category::RULE_ORDER
            .into_iter()
            .filter(|c| c.requires_notification() && summary.count(*c) > 0)
            .collect();

        if pending.is_empty() && summary.manual_review == 0 {
            let _ = writeln!(output, "\n{} No SCN notification required.", "✓".green());
            return;
        }

        if !pending.is_empty() {
            let _ = writeln!(output, "\n{} SCN notification required:", "⚠".yellow());
            for category in pending {
                let guidance = config
                    .notification_for(category)
                    .unwrap_or("See FedRAMP SCN guidance");
                let _ = writeln!(output, "   - {}: {guidance}", format_category(category));
            }
        }

        if summary.manual_review > 0 {
            let _ = writeln!(
                output,
                "\n{} {} change(s) need manual review before they can be categorized.",
                "⚠".yellow(),
                summary.manual_review
            );
        }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => to_json(&ValidationJson {
                valid: result.is_valid(),
                errors: result.errors.iter().map(ToString::to_string).collect(),
                warnings: result.warnings.clone(),
            }),
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Configuration is valid!\n", "✓".green())
                } else {
                    let mut output = format!(
                        "{} Configuration has {} error(s):\n",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                    output
                };

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                output
            }
        }
    }

    /// Formats the summary of a valid configuration.
    #[must_use]
    pub fn format_config_summary(&self, config: &ScnConfig) -> String {
        let ai = config.ai_fallback.as_ref();
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "version": config.version,
                "name": config.name,
                "impact_level": config.impact_level,
                "rules": config.rules.len(),
                "config_hash": ConfigHasher::new().hash_config(config),
                "ai_enabled": ai.is_some_and(|a| a.enabled),
                "ai_provider": ai.and_then(|a| a.provider.as_deref()),
            })),
            OutputFormat::Text => {
                let mut output = String::from("\nConfiguration summary:\n");
                let _ = writeln!(output, "   Name: {}", config.name.as_deref().unwrap_or("-"));
                let _ = writeln!(output, "   Version: {}", config.version);
                let _ = writeln!(
                    output,
                    "   Framework: {} ({})",
                    config.compliance_framework.as_deref().unwrap_or("-"),
                    config.impact_level.as_deref().unwrap_or("-")
                );
                for category in Category::RULE_ORDER {
                    let _ = writeln!(
                        output,
                        "   {} rules: {}",
                        category.label(),
                        config.rules.rules_for(category).len()
                    );
                }
                let ai_line = match ai {
                    Some(a) if a.enabled => format!(
                        "enabled ({} / {}, threshold {})",
                        a.provider.as_deref().unwrap_or("no provider"),
                        a.model.as_deref().unwrap_or("no model"),
                        a.confidence_threshold
                    ),
                    _ => String::from("disabled"),
                };
                let _ = writeln!(output, "   AI fallback: {ai_line}");
                output
            }
        }
    }
}

/// Formats a category with color.
fn format_category(category: Category) -> String {
    let label = category.label();
    match category {
        Category::Routine => label.green().to_string(),
        Category::Adaptive => label.cyan().to_string(),
        Category::Transformative => label.yellow().to_string(),
        Category::Impact => label.red().bold().to_string(),
        Category::ManualReview => label.magenta().to_string(),
    }
}

/// Truncates a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// JSON serialization helpers

#[derive(Serialize)]
struct AnalysisJson<'a> {
    base_ref: &'a str,
    head_ref: &'a str,
    total_files: usize,
    terraform_files: usize,
    kubernetes_files: usize,
    cloudformation_files: usize,
    resources: usize,
}

impl<'a> From<&'a AnalysisReport> for AnalysisJson<'a> {
    fn from(report: &'a AnalysisReport) -> Self {
        Self {
            base_ref: &report.base_ref,
            head_ref: &report.head_ref,
            total_files: report.summary.total_files,
            terraform_files: report.summary.terraform_files,
            kubernetes_files: report.summary.kubernetes_files,
            cloudformation_files: report.summary.cloudformation_files,
            resources: report.resource_count(),
        }
    }
}

#[derive(Serialize)]
struct ClassificationJson<'a> {
    run_id: String,
    config_hash: &'a str,
    ai_enabled: bool,
    summary: &'a CategorySummary,
    requires_notification: Vec<NotificationJson<'a>>,
}

#[derive(Serialize)]
struct NotificationJson<'a> {
    file: &'a str,
    resource: &'a str,
    category: Category,
}

impl<'a> From<&'a ClassificationReport> for ClassificationJson<'a> {
    fn from(report: &'a ClassificationReport) -> Self {
        Self {
            run_id: report.run_id.to_string(),
            config_hash: &report.config_hash,
            ai_enabled: report.ai_enabled,
            summary: &report.summary,
            requires_notification: report
                .requires_notification()
                .into_iter()
                .map(|c| NotificationJson {
                    file: &c.file,
                    resource: &c.resource,
                    category: c.classification.category,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct ValidationJson {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classification, ClassifiedChange};
    use crate::config::effective_config;
    use chrono::Utc;
    use uuid::Uuid;

    fn report() -> ClassificationReport {
        let mut summary = CategorySummary::default();
        summary.record(Category::Impact);
        summary.record(Category::Routine);
        ClassificationReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            classifications: vec![
                ClassifiedChange {
                    file: String::from("main.tf"),
                    resource: String::from("aws_s3_bucket.data"),
                    classification: Classification::rule_based(
                        Category::Impact,
                        "Encryption changes",
                        "impact.attr:.*encryption.*",
                    ),
                },
                ClassifiedChange {
                    file: String::from("main.tf"),
                    resource: String::from("aws_instance.web"),
                    classification: Classification::rule_based(
                        Category::Routine,
                        "Tag changes",
                        "routine.pattern:tags.*",
                    ),
                },
            ],
            summary,
            config_version: String::from("1.0"),
            config_hash: "a".repeat(64),
            ai_enabled: false,
        }
    }

    #[test]
    fn test_classification_text_includes_guidance() {
        colored::control::set_override(false);
        let config = effective_config(None).unwrap();
        let text = OutputFormatter::new(OutputFormat::Text).format_classification(&report(), &config);

        assert!(text.contains("aws_s3_bucket.data"));
        assert!(text.contains("1 impact"));
        assert!(text.contains("IMPACT: "));
        assert!(!text.contains("ROUTINE: "));
    }

    #[test]
    fn test_classification_json_lists_notifications() {
        let config = effective_config(None).unwrap();
        let json = OutputFormatter::new(OutputFormat::Json).format_classification(&report(), &config);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["impact"], 1);
        assert_eq!(value["requires_notification"].as_array().unwrap().len(), 1);
        assert_eq!(value["requires_notification"][0]["category"], "IMPACT");
    }

    #[test]
    fn test_validation_json() {
        let mut result = ValidationResult::default();
        result.warnings.push(String::from("ai_fallback: no model"));
        let json = OutputFormatter::new(OutputFormat::Json).format_validation(&result, true);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["valid"], true);
        assert_eq!(value["warnings"][0], "ai_fallback: no model");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}
