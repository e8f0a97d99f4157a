//! Classification engine.
//!
//! Rules first, then the AI fallback when enabled, else `unmatched`. Changes
//! are classified one at a time and independently of each other.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::rules::{RuleMatch, RuleMatcher};
use super::types::{CategorySummary, Classification, ClassificationReport, ClassifiedChange, Method};
use crate::ai::AiClassifier;
use crate::analyzer::{AnalysisReport, ResourceChange};
use crate::config::{AiConfig, ConfigHasher, ScnConfig};
use crate::error::Result;

/// Classifies resource changes against an effective configuration.
#[derive(Debug)]
pub struct ClassificationEngine {
    matcher: RuleMatcher,
    ai: Option<AiClassifier>,
    config_version: String,
    config_hash: String,
}

impl ClassificationEngine {
    /// Creates an engine.
    ///
    /// AI fallback is enabled when `enable_ai` is set or the configuration
    /// enables it. `api_key` overrides the provider's environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule criterion is not a valid regex.
    pub fn new(config: &ScnConfig, enable_ai: bool, api_key: Option<&str>) -> Result<Self> {
        let matcher = RuleMatcher::new(&config.rules)?;

        let configured = config.ai_fallback.as_ref().is_some_and(|ai| ai.enabled);
        let ai = (enable_ai || configured)
            .then(|| AiClassifier::from_config(&effective_ai_config(config), api_key));

        let config_hash = ConfigHasher::new().hash_config(config);
        info!(
            "Classification engine ready: {} rules, AI fallback {}, config {}",
            matcher.len(),
            if ai.is_some() { "enabled" } else { "disabled" },
            ConfigHasher::short_hash(&config_hash)
        );

        Ok(Self {
            matcher,
            ai,
            config_version: config.version.clone(),
            config_hash,
        })
    }

    /// Replaces the AI dispatcher, enabling AI fallback.
    #[must_use]
    pub fn with_ai_classifier(mut self, ai: AiClassifier) -> Self {
        self.ai = Some(ai);
        self
    }

    /// Returns true if AI fallback is enabled.
    #[must_use]
    pub const fn ai_enabled(&self) -> bool {
        self.ai.is_some()
    }

    /// Returns the first matching rule for a change.
    #[must_use]
    pub fn classify_with_rules(&self, change: &ResourceChange) -> Option<RuleMatch<'_>> {
        self.matcher.classify(change)
    }

    /// Classifies one change. Never fails.
    pub async fn classify_change(&self, change: &ResourceChange) -> Classification {
        if let Some(hit) = self.classify_with_rules(change) {
            debug!("{} -> {} (rule)", change.address(), hit.category);
            return Classification::rule_based(
                hit.category,
                hit.rule.reasoning(),
                hit.rule.audit_label(),
            );
        }

        let Some(ai) = &self.ai else {
            debug!("{} -> no rule matched", change.address());
            return Classification::unmatched();
        };

        info!("Using AI fallback for {}", change.address());
        let verdict = ai.classify(change).await;
        Classification {
            category: verdict.category,
            method: Method::AiFallback,
            confidence: verdict.confidence,
            reasoning: verdict.reasoning,
            rule_matched: None,
            ai_model: ai.model().map(String::from),
        }
    }

    /// Classifies every resource change of an analysis report, in order.
    pub async fn classify_all(&self, report: &AnalysisReport) -> ClassificationReport {
        info!("Classifying {} resource changes", report.resource_count());

        let mut classifications = Vec::with_capacity(report.resource_count());
        let mut summary = CategorySummary::default();

        for file_change in &report.changes {
            for resource in &file_change.resources {
                let classification = self.classify_change(resource).await;
                summary.record(classification.category);
                classifications.push(ClassifiedChange {
                    file: file_change.file.clone(),
                    resource: resource.address(),
                    classification,
                });
            }
        }

        info!(
            "Classification summary: {} routine, {} adaptive, {} transformative, {} impact, {} manual review",
            summary.routine,
            summary.adaptive,
            summary.transformative,
            summary.impact,
            summary.manual_review
        );

        ClassificationReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            classifications,
            summary,
            config_version: self.config_version.clone(),
            config_hash: self.config_hash.clone(),
            ai_enabled: self.ai_enabled(),
        }
    }
}

/// Returns the AI settings an engine would use for `config`.
#[must_use]
pub fn effective_ai_config(config: &ScnConfig) -> AiConfig {
    config.ai_fallback.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiProvider;
    use crate::analyzer::{FileChange, IacFormat, Operation};
    use crate::classifier::Category;
    use crate::config::effective_config;
    use crate::error::Result as ScnResult;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl AiProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn call(&self, _prompt: &str) -> ScnResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn change(resource_type: &str, name: &str, operation: Operation, attributes: &[&str], diff: &str) -> ResourceChange {
        ResourceChange {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            operation,
            attributes_changed: attributes.iter().map(|a| (*a).to_string()).collect(),
            diff: diff.to_string(),
        }
    }

    fn unmatched_change() -> ResourceChange {
        change("aws_sqs_queue", "jobs", Operation::Create, &["visibility_timeout"], "+  visibility_timeout = 30")
    }

    fn ai_config() -> AiConfig {
        AiConfig {
            enabled: true,
            provider: Some(String::from("anthropic")),
            model: Some(String::from("claude-test")),
            ..AiConfig::default()
        }
    }

    fn default_engine() -> ClassificationEngine {
        ClassificationEngine::new(&effective_config(None).unwrap(), false, None).unwrap()
    }

    #[tokio::test]
    async fn test_tags_only_change_is_routine() {
        let result = default_engine()
            .classify_change(&change("aws_instance", "web", Operation::Modify, &["tags"], "+  tags = {}"))
            .await;

        assert_eq!(result.category, Category::Routine);
        assert_eq!(result.method, Method::RuleBased);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.reasoning, "Tag changes");
        assert_eq!(result.rule_matched.as_deref(), Some("routine.pattern:tags.*"));
    }

    #[tokio::test]
    async fn test_instance_type_change_is_adaptive() {
        let result = default_engine()
            .classify_change(&change(
                "aws_instance",
                "app",
                Operation::Modify,
                &["instance_type"],
                "+  instance_type = \"m5.large\"",
            ))
            .await;
        assert_eq!(result.category, Category::Adaptive);
    }

    #[tokio::test]
    async fn test_encryption_delete_is_impact() {
        let result = default_engine()
            .classify_change(&change(
                "aws_s3_bucket",
                "data",
                Operation::Delete,
                &["server_side_encryption_configuration"],
                "-  server_side_encryption_configuration {",
            ))
            .await;
        assert_eq!(result.category, Category::Impact);
    }

    #[tokio::test]
    async fn test_no_match_without_ai_is_unmatched() {
        let result = default_engine().classify_change(&unmatched_change()).await;

        assert_eq!(result.category, Category::ManualReview);
        assert_eq!(result.method, Method::Unmatched);
        assert!(result.confidence.abs() < f64::EPSILON);
        assert_eq!(result.reasoning, "No rule matched and AI fallback not enabled");
        assert!(result.ai_model.is_none());
    }

    #[tokio::test]
    async fn test_low_confidence_ai_answer_goes_to_manual_review() {
        let ai = AiClassifier::with_provider(
            ai_config(),
            Box::new(FixedProvider(
                r#"{"category": "ADAPTIVE", "confidence": 0.5, "reasoning": "Maybe capacity"}"#,
            )),
        );
        let engine = default_engine().with_ai_classifier(ai);
        let result = engine.classify_change(&unmatched_change()).await;

        assert_eq!(result.category, Category::ManualReview);
        assert_eq!(result.method, Method::AiFallback);
        assert!((result.confidence - 0.5).abs() < f64::EPSILON);
        assert!(result.reasoning.starts_with("Low confidence (0.50 < 0.8)"));
        assert_eq!(result.ai_model.as_deref(), Some("claude-test"));
    }

    #[tokio::test]
    async fn test_rules_win_over_ai() {
        let ai = AiClassifier::with_provider(
            ai_config(),
            Box::new(FixedProvider(r#"{"category": "IMPACT", "confidence": 1.0, "reasoning": "x"}"#)),
        );
        let engine = default_engine().with_ai_classifier(ai);
        let result = engine
            .classify_change(&change("aws_instance", "web", Operation::Modify, &["tags"], "+ tags"))
            .await;
        assert_eq!(result.category, Category::Routine);
        assert_eq!(result.method, Method::RuleBased);
    }

    #[tokio::test]
    async fn test_runtime_flag_enables_ai_without_provider() {
        let engine = ClassificationEngine::new(&effective_config(None).unwrap(), true, None).unwrap();
        assert!(engine.ai_enabled());

        let result = engine.classify_change(&unmatched_change()).await;
        assert_eq!(result.category, Category::ManualReview);
        assert_eq!(result.method, Method::AiFallback);
        assert!(result.reasoning.starts_with("AI fallback not available"));
    }

    #[test]
    fn test_config_flag_enables_ai() {
        let custom = json!({ "ai_fallback": { "enabled": true } });
        let config = effective_config(Some(&custom)).unwrap();
        assert!(ClassificationEngine::new(&config, false, None).unwrap().ai_enabled());

        let disabled = json!({ "ai_fallback": { "enabled": false } });
        let config = effective_config(Some(&disabled)).unwrap();
        assert!(!ClassificationEngine::new(&config, false, None).unwrap().ai_enabled());
        assert!(ClassificationEngine::new(&config, true, None).unwrap().ai_enabled());
    }

    #[tokio::test]
    async fn test_classify_all() {
        let report = AnalysisReport {
            changes: vec![
                FileChange {
                    file: String::from("infra/main.tf"),
                    format: IacFormat::Terraform,
                    resources: vec![
                        change("aws_instance", "web", Operation::Modify, &["tags"], "+ tags"),
                        unmatched_change(),
                    ],
                },
                FileChange {
                    file: String::from("infra/empty.tf"),
                    format: IacFormat::Terraform,
                    resources: Vec::new(),
                },
            ],
            ..AnalysisReport::default()
        };

        let engine = default_engine();
        let result = engine.classify_all(&report).await;

        assert_eq!(result.classifications.len(), 2);
        assert_eq!(result.classifications[0].resource, "aws_instance.web");
        assert_eq!(result.classifications[1].file, "infra/main.tf");
        assert_eq!(result.summary.routine, 1);
        assert_eq!(result.summary.manual_review, 1);
        assert_eq!(result.summary.total(), 2);
        assert_eq!(result.config_version, "1.0");
        assert_eq!(result.config_hash.len(), 64);
        assert!(!result.ai_enabled);
        assert_eq!(result.requires_notification().len(), 1);
    }

    #[test]
    fn test_invalid_rule_regex_fails_engine_creation() {
        let mut config = effective_config(None).unwrap();
        config.rules.routine[0].pattern = Some(String::from("tags("));
        assert!(ClassificationEngine::new(&config, false, None).is_err());
    }

    #[test]
    fn test_effective_ai_config_defaults() {
        let config = effective_config(None).unwrap();
        let ai = effective_ai_config(&config);
        assert!(!ai.enabled);
        assert!(ai.provider.is_none());
    }
}
