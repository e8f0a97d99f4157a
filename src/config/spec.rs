//! Configuration specification types for the SCN detector.
//!
//! These structs are the typed view of the effective configuration, i.e. the
//! user profile deep-merged over the built-in defaults. Structural checks run
//! on the untyped mapping first (see [`super::ConfigValidator`]), so the
//! types here only carry what classification needs.

use serde::{Deserialize, Deserializer, Serialize};

use crate::classifier::Category;

use super::defaults::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_DIFF_CHARS, DEFAULT_MAX_TOKENS,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT_TEMPLATE,
};

/// The root configuration structure for a classification run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScnConfig {
    /// Profile version string.
    pub version: String,
    /// Profile display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Profile description.
    #[serde(default)]
    pub description: Option<String>,
    /// Compliance framework the profile targets.
    #[serde(default)]
    pub compliance_framework: Option<String>,
    /// System impact level (Low, Moderate, High).
    #[serde(default)]
    pub impact_level: Option<String>,
    /// Classification rules, per category.
    #[serde(default)]
    pub rules: RuleSet,
    /// AI fallback settings. Absent unless explicitly configured.
    #[serde(default)]
    pub ai_fallback: Option<AiConfig>,
    /// Per-category notification guidance.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Rules grouped by category. Within a category, list order is priority.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    /// Rules yielding [`Category::Routine`].
    #[serde(default)]
    pub routine: Vec<Rule>,
    /// Rules yielding [`Category::Adaptive`].
    #[serde(default)]
    pub adaptive: Vec<Rule>,
    /// Rules yielding [`Category::Transformative`].
    #[serde(default)]
    pub transformative: Vec<Rule>,
    /// Rules yielding [`Category::Impact`].
    #[serde(default)]
    pub impact: Vec<Rule>,
}

/// A single classification rule.
///
/// Every criterion is independently optional. An absent criterion is always
/// satisfied; a rule matches when all present criteria match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    /// Human-readable description, used as classification reasoning.
    #[serde(default)]
    pub description: String,
    /// Regex over `"{type}.{name} {attributes} {diff}"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Regex over `"{type}.{name}"` (or `"{type}.{name}.{attribute}"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Regex over each changed attribute and over the diff text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Required operation, or `|`-separated alternatives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

/// AI fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    /// Whether AI fallback is enabled by configuration.
    #[serde(default)]
    pub enabled: bool,
    /// Provider identifier (`anthropic`, `openai`).
    #[serde(default)]
    pub provider: Option<String>,
    /// Model name passed to the provider.
    #[serde(default)]
    pub model: Option<String>,
    /// Minimum confidence required to accept an AI category.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Token limit for the provider response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Maximum diff characters included in the prompt.
    ///
    /// Non-numeric and non-positive values deserialize to `None`.
    #[serde(default, deserialize_with = "lenient_positive_usize")]
    pub max_diff_chars: Option<usize>,
    /// Override for the provider API base URL.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// System prompt prepended to every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// User prompt template with `{placeholder}` substitution.
    #[serde(default = "default_user_prompt_template")]
    pub user_prompt_template: String,
}

/// Notification guidance per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationsConfig {
    /// Guidance for adaptive changes.
    #[serde(default)]
    pub adaptive: Option<AdaptiveNotice>,
    /// Guidance for transformative changes.
    #[serde(default)]
    pub transformative: Option<TransformativeNotice>,
    /// Guidance for impact changes.
    #[serde(default)]
    pub impact: Option<ImpactNotice>,
}

/// Adaptive change notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdaptiveNotice {
    /// Days after completion by which to notify.
    #[serde(default)]
    pub post_completion_days: Option<u32>,
    /// Guidance text.
    #[serde(default)]
    pub description: Option<String>,
}

/// Transformative change notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformativeNotice {
    /// Days before implementation for the initial notice.
    #[serde(default)]
    pub initial_notice_days: Option<u32>,
    /// Days before implementation for the final notice.
    #[serde(default)]
    pub final_notice_days: Option<u32>,
    /// Whether a post-completion notice is required.
    #[serde(default)]
    pub post_completion_required: Option<bool>,
    /// Guidance text.
    #[serde(default)]
    pub description: Option<String>,
}

/// Impact change notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImpactNotice {
    /// Whether a new assessment is required.
    #[serde(default)]
    pub requires_new_assessment: Option<bool>,
    /// Guidance text.
    #[serde(default)]
    pub description: Option<String>,
}

// Default value functions

const fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

const fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_system_prompt() -> String {
    String::from(DEFAULT_SYSTEM_PROMPT)
}

fn default_user_prompt_template() -> String {
    String::from(DEFAULT_USER_PROMPT_TEMPLATE)
}

/// Accepts integers and numeric strings; anything else, or a non-positive
/// value, becomes `None`.
fn lenient_positive_usize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match &value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(number
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok()))
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: None,
            model: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_diff_chars: None,
            api_base_url: None,
            system_prompt: default_system_prompt(),
            user_prompt_template: default_user_prompt_template(),
        }
    }
}

impl AiConfig {
    /// Returns the diff truncation length, falling back to the default.
    #[must_use]
    pub fn effective_max_diff_chars(&self) -> usize {
        self.max_diff_chars.unwrap_or(DEFAULT_MAX_DIFF_CHARS)
    }
}

impl RuleSet {
    /// Returns the rules configured for a category.
    ///
    /// `ManualReview` never has rules.
    #[must_use]
    pub fn rules_for(&self, category: Category) -> &[Rule] {
        match category {
            Category::Routine => &self.routine,
            Category::Adaptive => &self.adaptive,
            Category::Transformative => &self.transformative,
            Category::Impact => &self.impact,
            Category::ManualReview => &[],
        }
    }

    /// Iterates all rules in evaluation order: category order, then list order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (Category, &Rule)> {
        Category::RULE_ORDER
            .into_iter()
            .flat_map(move |category| self.rules_for(category).iter().map(move |r| (category, r)))
    }

    /// Returns the total number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routine.len() + self.adaptive.len() + self.transformative.len() + self.impact.len()
    }

    /// Returns true if no rules are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScnConfig {
    /// Deserializes the typed configuration from an effective mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping does not fit the typed model.
    pub fn from_value(value: serde_json::Value) -> crate::error::Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            crate::error::ConfigError::parse(format!("Invalid configuration structure: {e}"), None)
                .into()
        })
    }

    /// Returns notification guidance text for a category, if configured.
    #[must_use]
    pub fn notification_for(&self, category: Category) -> Option<&str> {
        match category {
            Category::Adaptive => self.notifications.adaptive.as_ref()?.description.as_deref(),
            Category::Transformative => self
                .notifications
                .transformative
                .as_ref()?
                .description
                .as_deref(),
            Category::Impact => self.notifications.impact.as_ref()?.description.as_deref(),
            Category::Routine | Category::ManualReview => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_field_defaults() {
        let config: AiConfig =
            serde_json::from_value(serde_json::json!({ "provider": "openai" })).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.provider.as_deref(), Some("openai"));
        assert!(config.model.is_none());
        assert!((config.confidence_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.effective_max_diff_chars(), 1000);
        assert!(config.user_prompt_template.contains("{resource_type}"));
    }

    #[test]
    fn test_max_diff_chars_lenient() {
        for (raw, expected) in [
            (serde_json::json!(50), 50),
            (serde_json::json!("200"), 200),
            (serde_json::json!("invalid"), 1000),
            (serde_json::json!(0), 1000),
            (serde_json::json!(-5), 1000),
            (serde_json::json!(null), 1000),
        ] {
            let config: AiConfig =
                serde_json::from_value(serde_json::json!({ "max_diff_chars": raw })).unwrap();
            assert_eq!(config.effective_max_diff_chars(), expected);
        }
    }

    #[test]
    fn test_rule_set_order() {
        let rules = RuleSet {
            routine: vec![Rule { description: String::from("r"), ..Rule::default() }],
            impact: vec![Rule { description: String::from("i"), ..Rule::default() }],
            adaptive: vec![Rule { description: String::from("a"), ..Rule::default() }],
            transformative: Vec::new(),
        };
        let order: Vec<_> = rules.iter_ordered().map(|(c, r)| (c, r.description.as_str())).collect();
        assert_eq!(
            order,
            vec![
                (Category::Routine, "r"),
                (Category::Adaptive, "a"),
                (Category::Impact, "i"),
            ]
        );
        assert_eq!(rules.len(), 3);
    }
}
