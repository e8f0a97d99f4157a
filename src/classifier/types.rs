//! Classification result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// SCN change category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Regular maintenance; no notification required.
    Routine,
    /// Frequent improvements; notify after completion.
    Adaptive,
    /// Significant changes; advance and final notices.
    Transformative,
    /// Security boundary changes; new assessment required.
    Impact,
    /// Could not be determined automatically.
    ManualReview,
}

impl Category {
    /// Categories that carry rules, in evaluation order.
    pub const RULE_ORDER: [Self; 4] = [
        Self::Routine,
        Self::Adaptive,
        Self::Transformative,
        Self::Impact,
    ];

    /// Returns the lower-case key used in configuration and summaries.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::Adaptive => "adaptive",
            Self::Transformative => "transformative",
            Self::Impact => "impact",
            Self::ManualReview => "manual_review",
        }
    }

    /// Returns the upper-case label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Routine => "ROUTINE",
            Self::Adaptive => "ADAPTIVE",
            Self::Transformative => "TRANSFORMATIVE",
            Self::Impact => "IMPACT",
            Self::ManualReview => "MANUAL_REVIEW",
        }
    }

    /// Parses a category name as returned by an AI provider.
    ///
    /// Matching is case-insensitive; `MANUAL_REVIEW` is accepted too.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        [
            Self::Routine,
            Self::Adaptive,
            Self::Transformative,
            Self::Impact,
            Self::ManualReview,
        ]
        .into_iter()
        .find(|c| c.label().eq_ignore_ascii_case(name))
    }

    /// Returns true if the category requires an SCN.
    #[must_use]
    pub const fn requires_notification(self) -> bool {
        !matches!(self, Self::Routine)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a classification was reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// A configured rule matched.
    RuleBased,
    /// The AI fallback was consulted.
    AiFallback,
    /// No rule matched and AI was off.
    Unmatched,
}

impl Method {
    /// Returns the method name as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RuleBased => "rule-based",
            Self::AiFallback => "ai-fallback",
            Self::Unmatched => "unmatched",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classification of one resource change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    /// Assigned category.
    pub category: Category,
    /// How the category was reached.
    pub method: Method,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Human-readable reasoning.
    pub reasoning: String,
    /// Audit string of the matching rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_matched: Option<String>,
    /// Model consulted by the AI fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
}

impl Classification {
    /// Reasoning recorded when nothing could classify a change.
    pub const UNMATCHED_REASONING: &'static str = "No rule matched and AI fallback not enabled";

    /// Creates a rule-based classification.
    #[must_use]
    pub fn rule_based(category: Category, reasoning: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            category,
            method: Method::RuleBased,
            confidence: 1.0,
            reasoning: reasoning.into(),
            rule_matched: Some(rule.into()),
            ai_model: None,
        }
    }

    /// Creates the classification for a change no rule matched while AI is off.
    #[must_use]
    pub fn unmatched() -> Self {
        Self {
            category: Category::ManualReview,
            method: Method::Unmatched,
            confidence: 0.0,
            reasoning: String::from(Self::UNMATCHED_REASONING),
            rule_matched: None,
            ai_model: None,
        }
    }
}

/// Per-category counts for a classification run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorySummary {
    /// Routine changes.
    pub routine: usize,
    /// Adaptive changes.
    pub adaptive: usize,
    /// Transformative changes.
    pub transformative: usize,
    /// Impact changes.
    pub impact: usize,
    /// Changes needing manual review.
    pub manual_review: usize,
}

impl CategorySummary {
    /// Records one classified change.
    pub const fn record(&mut self, category: Category) {
        match category {
            Category::Routine => self.routine += 1,
            Category::Adaptive => self.adaptive += 1,
            Category::Transformative => self.transformative += 1,
            Category::Impact => self.impact += 1,
            Category::ManualReview => self.manual_review += 1,
        }
    }

    /// Returns the count for a category.
    #[must_use]
    pub const fn count(&self, category: Category) -> usize {
        match category {
            Category::Routine => self.routine,
            Category::Adaptive => self.adaptive,
            Category::Transformative => self.transformative,
            Category::Impact => self.impact,
            Category::ManualReview => self.manual_review,
        }
    }

    /// Returns the total number of classified changes.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.routine + self.adaptive + self.transformative + self.impact + self.manual_review
    }
}

/// One classified resource change with its file context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedChange {
    /// File the resource was found in.
    pub file: String,
    /// `type.name` address of the resource.
    pub resource: String,
    /// The classification.
    #[serde(flatten)]
    pub classification: Classification,
}

/// Output of a classification run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationReport {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// One entry per resource change, in input order.
    pub classifications: Vec<ClassifiedChange>,
    /// Counts per category.
    pub summary: CategorySummary,
    /// Version of the effective configuration.
    pub config_version: String,
    /// Fingerprint of the effective rules and AI policy.
    pub config_hash: String,
    /// Whether the AI fallback was enabled for the run.
    pub ai_enabled: bool,
}

impl ClassificationReport {
    /// Returns the changes that require a notification (everything except
    /// routine).
    #[must_use]
    pub fn requires_notification(&self) -> Vec<&ClassifiedChange> {
        self.classifications
            .iter()
            .filter(|c| c.classification.category.requires_notification())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serialization() {
        assert_eq!(
            serde_json::to_string(&Category::ManualReview).unwrap(),
            "\"MANUAL_REVIEW\""
        );
        assert_eq!(serde_json::to_string(&Category::Routine).unwrap(), "\"ROUTINE\"");
        assert_eq!(serde_json::to_string(&Method::AiFallback).unwrap(), "\"ai-fallback\"");
    }

    #[test]
    fn test_category_from_name() {
        assert_eq!(Category::from_name("adaptive"), Some(Category::Adaptive));
        assert_eq!(Category::from_name(" IMPACT "), Some(Category::Impact));
        assert_eq!(Category::from_name("manual_review"), Some(Category::ManualReview));
        assert_eq!(Category::from_name("SEVERE"), None);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = CategorySummary::default();
        summary.record(Category::Routine);
        summary.record(Category::ManualReview);
        summary.record(Category::ManualReview);

        assert_eq!(summary.count(Category::Routine), 1);
        assert_eq!(summary.manual_review, 2);
        assert_eq!(summary.total(), 3);

        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["manual_review"], 2);
        assert_eq!(json["impact"], 0);
    }

    #[test]
    fn test_classified_change_is_flat() {
        let change = ClassifiedChange {
            file: String::from("main.tf"),
            resource: String::from("aws_instance.web"),
            classification: Classification::unmatched(),
        };
        let json = serde_json::to_value(&change).unwrap();

        assert_eq!(json["category"], "MANUAL_REVIEW");
        assert_eq!(json["method"], "unmatched");
        assert_eq!(json["resource"], "aws_instance.web");
        assert!(json.get("rule_matched").is_none());
    }

    #[test]
    fn test_requires_notification() {
        let entry = |category| ClassifiedChange {
            file: String::from("main.tf"),
            resource: String::from("x.y"),
            classification: Classification::rule_based(category, "r", "routine"),
        };
        let report = ClassificationReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            classifications: vec![entry(Category::Routine), entry(Category::Impact)],
            summary: CategorySummary::default(),
            config_version: String::from("1.0"),
            config_hash: String::new(),
            ai_enabled: false,
        };

        let pending = report.requires_notification();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].classification.category, Category::Impact);
    }
}
