//! Built-in configuration values.
//!
//! The default profile is a plain mapping so that user profiles can be
//! deep-merged over it before typing. It deliberately has no `ai_fallback`
//! section: AI classification is opt-in.

use serde_json::{Value, json};

/// Default minimum AI confidence.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Default token limit for AI responses.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Default number of diff characters included in an AI prompt.
pub const DEFAULT_MAX_DIFF_CHARS: usize = 1000;

/// Provider-agnostic system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a FedRAMP compliance expert analyzing infrastructure changes for Low impact systems.
You are performing this task because a rules-based classification could not confidently categorize the change.

Use the following guidelines to classify the change:

FedRAMP Change Categories:
- ROUTINE: Regular maintenance, patching, minor capacity changes (no notification required)
- ADAPTIVE: Frequent improvements with minimal security plan changes (10 days after completion)
- TRANSFORMATIVE: Rare, significant changes altering risk profile (30 days initial + 10 days final notice)
- IMPACT: Changes to security boundary or FIPS level (requires new assessment)";

/// Provider-agnostic user prompt template.
///
/// `{{` and `}}` render as literal braces.
pub const DEFAULT_USER_PROMPT_TEMPLATE: &str = "\
Change Details:
- Resource Type: {resource_type}
- Resource Name: {resource_name}
- Operation: {operation}
- Attributes Changed: {attributes}
- Diff Preview:
{diff_snippet}

Classify this change. Respond ONLY with valid JSON in this exact format:
{{
  \"category\": \"ROUTINE|ADAPTIVE|TRANSFORMATIVE|IMPACT\",
  \"confidence\": 0.0-1.0,
  \"reasoning\": \"Brief explanation (max 200 chars)\"
}}";

/// Returns the built-in classification rules.
#[must_use]
pub fn default_rules() -> Value {
    json!({
        "routine": [
            { "pattern": "tags.*", "description": "Tag changes" },
            { "pattern": "description", "description": "Description changes" }
        ],
        "adaptive": [
            { "resource": "aws_ami\\..*", "operation": "modify", "description": "AMI updates" },
            {
                "resource": "aws_instance\\..*\\.instance_type",
                "operation": "modify",
                "description": "Instance type changes"
            }
        ],
        "transformative": [
            { "pattern": "provider\\..*\\.region", "operation": "modify", "description": "Region changes" },
            { "resource": "aws_rds_.*\\.engine", "operation": "modify", "description": "Database engine changes" }
        ],
        "impact": [
            { "attribute": ".*encryption.*", "operation": "delete|modify", "description": "Encryption changes" },
            {
                "resource": "aws_security_group\\..*",
                "attribute": "ingress",
                "pattern": "0\\.0\\.0\\.0/0",
                "description": "Public security group"
            }
        ]
    })
}

/// Returns the built-in notification guidance.
#[must_use]
pub fn default_notifications() -> Value {
    json!({
        "adaptive": {
            "post_completion_days": 10,
            "description": "This change is classified as Adaptive. Notify your organization's security team within 10 days after completion so documentation can be updated if your policies require it."
        },
        "transformative": {
            "initial_notice_days": 30,
            "final_notice_days": 10,
            "post_completion_required": true,
            "description": "This change is classified as Transformative. Provide an initial notice 30 days before implementation, a final notice 10 days before implementation, and a post-completion notification."
        },
        "impact": {
            "requires_new_assessment": true,
            "description": "This change is classified as Impact. A new security assessment and authorization is required before implementation. Notify your compliance team immediately."
        }
    })
}

/// Returns the complete default configuration mapping.
#[must_use]
pub fn default_config() -> Value {
    json!({
        "version": "1.0",
        "name": "Default FedRAMP Profile",
        "description": "Built-in FedRAMP-aligned classification rules",
        "compliance_framework": "FedRAMP 20X",
        "impact_level": "Low",
        "rules": default_rules(),
        "notifications": default_notifications()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_sections() {
        let config = default_config();
        for key in ["version", "name", "rules", "notifications"] {
            assert!(config.get(key).is_some(), "missing {key}");
        }
        assert!(config.get("ai_fallback").is_none());

        for category in ["routine", "adaptive", "transformative", "impact"] {
            let rules = config["rules"][category].as_array().unwrap();
            assert!(!rules.is_empty());
        }
    }

    #[test]
    fn test_default_notification_timelines() {
        let notifications = default_notifications();
        assert_eq!(notifications["adaptive"]["post_completion_days"], 10);
        assert_eq!(notifications["transformative"]["initial_notice_days"], 30);
        assert_eq!(notifications["transformative"]["final_notice_days"], 10);
        assert_eq!(notifications["impact"]["requires_new_assessment"], true);
    }

    #[test]
    fn test_default_template_placeholders() {
        for placeholder in [
            "{resource_type}",
            "{resource_name}",
            "{operation}",
            "{attributes}",
            "{diff_snippet}",
        ] {
            assert!(DEFAULT_USER_PROMPT_TEMPLATE.contains(placeholder));
        }
    }
}
