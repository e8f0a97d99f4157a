//! Configuration validation for SCN profiles.
//!
//! Validation runs over the untyped, merged mapping so that wrong types are
//! reported with their field path instead of surfacing as a deserialization
//! failure. All problems are collected before the first one is returned.

use crate::ai::ProviderKind;
use crate::classifier::Category;
use crate::error::{ConfigError, Result};
use regex::RegexBuilder;
use serde_json::{Map, Value};
use tracing::debug;

/// Validator for SCN configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

/// Allowed `impact_level` values.
const VALID_IMPACT_LEVELS: &[&str] = &["Low", "Moderate", "High"];

/// Categories that carry notification guidance.
const NOTIFICATION_KEYS: &[&str] = &["adaptive", "transformative", "impact"];

/// Rule criteria, all of which must be strings when present.
const RULE_FIELDS: &[&str] = &["pattern", "resource", "attribute", "operation"];

/// Rule criteria compiled as regular expressions.
const REGEX_FIELDS: &[&str] = &["pattern", "resource", "attribute"];

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates an SCN configuration mapping.
    ///
    /// # Errors
    ///
    /// Returns the first collected error if validation fails.
    pub fn validate(&self, config: &Value) -> Result<ValidationResult> {
        let result = self.check(config);
        Self::finish(result)
    }

    /// Collects every error and warning without failing.
    #[must_use]
    pub fn check(&self, config: &Value) -> ValidationResult {
        let mut result = ValidationResult::default();

        let Some(map) = config.as_object() else {
            result.push("config", "must be a mapping");
            return result;
        };

        match map.get("version") {
            None => result.push("version", "required field missing"),
            Some(v) if !v.is_string() => result.push("version", "must be a string"),
            Some(_) => {}
        }

        match map.get("rules") {
            None => result.push("rules", "required field missing"),
            Some(rules) => Self::validate_rules(rules, &mut result),
        }

        for field in ["name", "description", "compliance_framework"] {
            if map.get(field).is_some_and(|v| !v.is_string()) {
                result.push(field, "must be a string");
            }
        }

        if let Some(level) = map.get("impact_level") {
            match level.as_str() {
                None => result.push("impact_level", "must be a string"),
                Some(s) if !VALID_IMPACT_LEVELS.contains(&s) => result.push(
                    "impact_level",
                    format!(
                        "\"{s}\" is not valid (valid: {})",
                        VALID_IMPACT_LEVELS.join(", ")
                    ),
                ),
                Some(_) => {}
            }
        }

        if let Some(ai) = map.get("ai_fallback") {
            Self::validate_ai_fields(ai, "ai_fallback", &mut result);
        }

        if let Some(notifications) = map.get("notifications") {
            Self::validate_notifications(notifications, &mut result);
        }

        result
    }

    /// Validates a standalone AI configuration (AI fields at the top level).
    ///
    /// # Errors
    ///
    /// Returns the first collected error if validation fails.
    pub fn validate_ai_config(&self, config: &Value) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();
        Self::validate_ai_fields(config, "ai_config", &mut result);
        Self::finish(result)
    }

    fn finish(result: ValidationResult) -> Result<ValidationResult> {
        if let Some(first_error) = result.errors.first() {
            for error in &result.errors {
                debug!("Validation error: {error}");
            }
            let message = if result.errors.len() > 1 {
                format!(
                    "{} (and {} more)",
                    first_error.message,
                    result.errors.len() - 1
                )
            } else {
                first_error.message.clone()
            };
            return Err(ConfigError::validation(message, first_error.field.clone()).into());
        }

        debug!("Configuration validation passed");
        Ok(result)
    }

    /// Validates the rules section.
    fn validate_rules(rules: &Value, result: &mut ValidationResult) {
        let Some(rules) = rules.as_object() else {
            result.push("rules", "must be a mapping");
            return;
        };

        if rules.is_empty() {
            result.push(
                "rules",
                "must contain at least one category (routine, adaptive, transformative, impact)",
            );
            return;
        }

        let valid: Vec<&str> = Category::RULE_ORDER.iter().map(|c| c.key()).collect();
        for key in rules.keys() {
            if !valid.contains(&key.as_str()) {
                result.push(
                    "rules",
                    format!("unknown category \"{key}\" (valid: {})", valid.join(", ")),
                );
            }
        }

        for category in &valid {
            let Some(category_rules) = rules.get(*category) else {
                continue;
            };
            let prefix = format!("rules.{category}");

            let Some(list) = category_rules.as_array() else {
                result.push(&prefix, "must be an array");
                continue;
            };

            if list.is_empty() {
                result.push(&prefix, "must have at least 1 rule");
                continue;
            }

            for (i, rule) in list.iter().enumerate() {
                Self::validate_rule(rule, &format!("{prefix}[{i}]"), result);
            }
        }
    }

    /// Validates a single classification rule.
    fn validate_rule(rule: &Value, path: &str, result: &mut ValidationResult) {
        let Some(rule) = rule.as_object() else {
            result.push(path, "must be an object");
            return;
        };

        match rule.get("description") {
            None => result.push(format!("{path}.description"), "required field missing"),
            Some(v) if !v.is_string() => {
                result.push(format!("{path}.description"), "must be a string");
            }
            Some(_) => {}
        }

        if !REGEX_FIELDS.iter().any(|f| rule.contains_key(*f)) {
            result.push(path, "must have at least one of pattern, resource, or attribute");
        }

        for field in RULE_FIELDS {
            if rule.get(*field).is_some_and(|v| !v.is_string()) {
                result.push(format!("{path}.{field}"), "must be a string");
            }
        }

        for field in REGEX_FIELDS {
            if let Some(pattern) = rule.get(*field).and_then(Value::as_str)
                && let Err(e) = RegexBuilder::new(pattern).case_insensitive(true).build()
            {
                result.push(format!("{path}.{field}"), format!("invalid regex: {e}"));
            }
        }
    }

    /// Validates AI configuration fields.
    fn validate_ai_fields(config: &Value, prefix: &str, result: &mut ValidationResult) {
        let Some(ai) = config.as_object() else {
            result.push(prefix, "must be a mapping");
            return;
        };

        if ai.get("enabled").is_some_and(|v| !v.is_boolean()) {
            result.push(format!("{prefix}.enabled"), "must be a boolean");
        }

        if let Some(provider) = ai.get("provider") {
            match provider.as_str() {
                None => result.push(format!("{prefix}.provider"), "must be a string"),
                Some(name) if ProviderKind::from_name(name).is_none() => result.push(
                    format!("{prefix}.provider"),
                    format!(
                        "\"{name}\" is not valid (valid: {})",
                        ProviderKind::supported_names()
                    ),
                ),
                Some(_) => {}
            }
        }

        if ai.get("model").is_some_and(|v| !v.is_string()) {
            result.push(format!("{prefix}.model"), "must be a string");
        }

        if let Some(threshold) = ai.get("confidence_threshold") {
            match threshold.as_f64() {
                None => result.push(format!("{prefix}.confidence_threshold"), "must be a number"),
                Some(t) if !(0.0..=1.0).contains(&t) => result.push(
                    format!("{prefix}.confidence_threshold"),
                    "must be between 0.0 and 1.0",
                ),
                Some(_) => {}
            }
        }

        for field in ["max_tokens", "max_diff_chars"] {
            if let Some(value) = ai.get(field) {
                match value.as_i64() {
                    None => result.push(format!("{prefix}.{field}"), "must be an integer"),
                    Some(n) if n < 1 => result.push(format!("{prefix}.{field}"), "must be >= 1"),
                    Some(_) => {}
                }
            }
        }

        for field in ["api_base_url", "system_prompt", "user_prompt_template"] {
            if ai.get(field).is_some_and(|v| !v.is_string()) {
                result.push(format!("{prefix}.{field}"), "must be a string");
            }
        }

        if ai.get("enabled").and_then(Value::as_bool) == Some(true) {
            for field in ["provider", "model"] {
                if !ai.contains_key(field) {
                    result.warnings.push(format!(
                        "{prefix}.{field}: AI fallback is enabled but no {field} is set; \
                         unmatched changes will go to manual review"
                    ));
                }
            }
        }
    }

    /// Validates the notifications section.
    fn validate_notifications(notifications: &Value, result: &mut ValidationResult) {
        let Some(notifications) = notifications.as_object() else {
            result.push("notifications", "must be a mapping");
            return;
        };

        for key in notifications.keys() {
            if !NOTIFICATION_KEYS.contains(&key.as_str()) {
                result.push(
                    "notifications",
                    format!(
                        "unknown key \"{key}\" (valid: {})",
                        NOTIFICATION_KEYS.join(", ")
                    ),
                );
            }
        }

        let typed_fields: [(&str, &[(&str, FieldKind)]); 3] = [
            (
                "adaptive",
                &[
                    ("post_completion_days", FieldKind::Integer),
                    ("description", FieldKind::String),
                ],
            ),
            (
                "transformative",
                &[
                    ("initial_notice_days", FieldKind::Integer),
                    ("final_notice_days", FieldKind::Integer),
                    ("post_completion_required", FieldKind::Boolean),
                    ("description", FieldKind::String),
                ],
            ),
            (
                "impact",
                &[
                    ("requires_new_assessment", FieldKind::Boolean),
                    ("description", FieldKind::String),
                ],
            ),
        ];

        for (section, fields) in typed_fields {
            match notifications.get(section) {
                None | Some(Value::Null) => {}
                Some(Value::Object(map)) => {
                    Self::validate_typed_fields(map, &format!("notifications.{section}"), fields, result);
                }
                Some(_) => result.push(format!("notifications.{section}"), "must be a mapping"),
            }
        }
    }

    fn validate_typed_fields(
        map: &Map<String, Value>,
        prefix: &str,
        fields: &[(&str, FieldKind)],
        result: &mut ValidationResult,
    ) {
        for (field, kind) in fields {
            if let Some(value) = map.get(*field)
                && !kind.accepts(value)
            {
                result.push(format!("{prefix}.{field}"), kind.message());
            }
        }
    }
}

/// Expected JSON type of a scalar field.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Integer,
    Boolean,
    String,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::String => value.is_string(),
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::Integer => "must be an integer",
            Self::Boolean => "must be a boolean",
            Self::String => "must be a string",
        }
    }
}

impl ValidationResult {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
