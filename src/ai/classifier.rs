//! AI fallback dispatcher.
//!
//! Consulted only for changes no rule matched. Every failure (missing
//! provider or credential, transport error, unparsable answer) is turned
//! into a manual-review verdict with a diagnostic reasoning string, so
//! [`AiClassifier::classify`] never fails.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::prompt::build_prompt;
use super::provider::{
    AiProvider, ProviderKind, ProviderSettings, create_provider, resolve_api_key,
    resolve_api_key_with,
};
use crate::analyzer::ResourceChange;
use crate::classifier::Category;
use crate::config::AiConfig;
use crate::error::AiError;

/// Outcome of an AI classification.
#[derive(Debug, Clone, PartialEq)]
pub struct AiVerdict {
    /// Category after confidence gating.
    pub category: Category,
    /// Provider-reported confidence, clamped to `[0, 1]`; 0.0 on failure.
    pub confidence: f64,
    /// Provider reasoning or a diagnostic message.
    pub reasoning: String,
}

impl AiVerdict {
    /// Creates a manual-review verdict with zero confidence.
    #[must_use]
    pub fn manual_review(reasoning: impl Into<String>) -> Self {
        Self {
            category: Category::ManualReview,
            confidence: 0.0,
            reasoning: reasoning.into(),
        }
    }
}

/// Dispatches unmatched changes to the configured AI provider.
pub struct AiClassifier {
    config: AiConfig,
    provider: Result<Box<dyn AiProvider>, AiError>,
}

impl std::fmt::Debug for AiClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClassifier")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("model", &self.config.model)
            .field("confidence_threshold", &self.config.confidence_threshold)
            .finish()
    }
}

impl AiClassifier {
    /// Creates a dispatcher from configuration.
    ///
    /// The API key is `api_key` when given, otherwise the provider's
    /// environment variable. A missing provider, model or key leaves the
    /// dispatcher unavailable; it then answers every change with manual
    /// review.
    #[must_use]
    pub fn from_config(config: &AiConfig, api_key: Option<&str>) -> Self {
        Self::build(config, |kind| resolve_api_key(kind, api_key))
    }

    /// Like [`AiClassifier::from_config`] with a custom environment lookup.
    #[must_use]
    pub fn from_config_with<F>(config: &AiConfig, api_key: Option<&str>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::build(config, |kind| resolve_api_key_with(kind, api_key, lookup))
    }

    fn build<K>(config: &AiConfig, resolve_key: K) -> Self
    where
        K: FnOnce(ProviderKind) -> Option<String>,
    {
        let provider = Self::build_provider(config, resolve_key);
        match &provider {
            Ok(p) => info!(
                "AI fallback using {} model {}",
                p.name(),
                config.model.as_deref().unwrap_or_default()
            ),
            Err(reason) => warn!("AI fallback not available: {reason}"),
        }
        Self {
            config: config.clone(),
            provider,
        }
    }

    /// Creates a dispatcher around an existing provider.
    #[must_use]
    pub fn with_provider(config: AiConfig, provider: Box<dyn AiProvider>) -> Self {
        Self {
            config,
            provider: Ok(provider),
        }
    }

    fn build_provider<K>(
        config: &AiConfig,
        resolve_key: K,
    ) -> Result<Box<dyn AiProvider>, AiError>
    where
        K: FnOnce(ProviderKind) -> Option<String>,
    {
        let name = config
            .provider
            .as_deref()
            .ok_or(AiError::NotConfigured { setting: "provider" })?;
        let kind = ProviderKind::lookup(name)?;
        let model = config
            .model
            .as_deref()
            .ok_or(AiError::NotConfigured { setting: "model" })?;
        let key = resolve_key(kind).ok_or(AiError::MissingApiKey {
            env_var: kind.env_var(),
        })?;

        let settings = ProviderSettings::new(key, model, config.max_tokens)
            .with_base_url(config.api_base_url.clone());
        create_provider(kind, settings)
    }

    /// Returns true if a provider is ready to be called.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.provider.is_ok()
    }

    /// Returns the configured model name.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.config.model.as_deref()
    }

    /// Classifies one change. Never fails.
    pub async fn classify(&self, change: &ResourceChange) -> AiVerdict {
        let provider = match &self.provider {
            Ok(provider) => provider,
            Err(reason) => {
                return AiVerdict::manual_review(format!("AI fallback not available ({reason})"));
            }
        };

        let prompt = build_prompt(change, &self.config);
        debug!(
            "Requesting AI classification for {} ({} prompt chars)",
            change.address(),
            prompt.chars().count()
        );

        let text = match provider.call(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("AI classification failed for {}: {e}", change.address());
                return AiVerdict::manual_review(format!("AI API error: {e}"));
            }
        };

        let verdict = match parse_response(&text) {
            Ok(verdict) => verdict,
            Err(reasoning) => {
                warn!("AI response rejected for {}: {reasoning}", change.address());
                return AiVerdict::manual_review(reasoning);
            }
        };

        self.gate(verdict)
    }

    /// Forces manual review when confidence is below the threshold.
    fn gate(&self, verdict: AiVerdict) -> AiVerdict {
        let threshold = self.config.confidence_threshold;
        if verdict.confidence < threshold {
            debug!(
                "AI confidence {:.2} below threshold {threshold}",
                verdict.confidence
            );
            return AiVerdict {
                category: Category::ManualReview,
                confidence: verdict.confidence,
                reasoning: format!(
                    "Low confidence ({:.2} < {threshold}): {}",
                    verdict.confidence, verdict.reasoning
                ),
            };
        }
        verdict
    }
}

/// Parses the provider's answer into an ungated verdict.
///
/// The error value is the diagnostic reasoning for manual review.
fn parse_response(text: &str) -> Result<AiVerdict, String> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| format!("AI returned invalid JSON: {e}"))?;

    let parse_error = |detail: &str| format!("AI response parse error: {detail}");

    let object = value
        .as_object()
        .ok_or_else(|| parse_error("expected a JSON object"))?;

    let raw_category = object
        .get("category")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_error("'category' must be a string"))?;
    let category = Category::from_name(raw_category)
        .ok_or_else(|| parse_error(&format!("unknown category '{raw_category}'")))?;

    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| parse_error("'confidence' must be a number"))?;

    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_error("'reasoning' must be a string"))?;

    Ok(AiVerdict {
        category,
        confidence: confidence.clamp(0.0, 1.0),
        reasoning: reasoning.to_string(),
    })
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop an info string such as `json` on the opening line.
    inner
        .split_once('\n')
        .map_or(inner, |(first, rest)| {
            if first.trim().chars().all(char::is_alphanumeric) {
                rest
            } else {
                inner
            }
        })
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Operation;
    use crate::error::{AiError, Result as ScnResult};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct StubProvider {
        reply: std::result::Result<String, String>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl StubProvider {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Arc::default(),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl AiProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn call(&self, prompt: &str) -> ScnResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|message| AiError::network(message).into())
        }
    }

    fn change() -> ResourceChange {
        ResourceChange {
            resource_type: String::from("aws_lambda_function"),
            name: String::from("worker"),
            operation: Operation::Modify,
            attributes_changed: vec![String::from("memory_size")],
            diff: String::from("-  memory_size = 128\n+  memory_size = 512"),
        }
    }

    fn config() -> AiConfig {
        AiConfig {
            enabled: true,
            provider: Some(String::from("anthropic")),
            model: Some(String::from("claude-test")),
            ..AiConfig::default()
        }
    }

    fn classifier(reply: &str) -> AiClassifier {
        AiClassifier::with_provider(config(), Box::new(StubProvider::replying(reply)))
    }

    #[tokio::test]
    async fn test_confident_answer_is_accepted() {
        let verdict = classifier(
            r#"{"category": "ADAPTIVE", "confidence": 0.92, "reasoning": "Capacity change"}"#,
        )
        .classify(&change())
        .await;

        assert_eq!(verdict.category, Category::Adaptive);
        assert!((verdict.confidence - 0.92).abs() < f64::EPSILON);
        assert_eq!(verdict.reasoning, "Capacity change");
    }

    #[tokio::test]
    async fn test_low_confidence_forces_manual_review() {
        let verdict = classifier(r#"{"category": "ADAPTIVE", "confidence": 0.5, "reasoning": "Unsure"}"#)
            .classify(&change())
            .await;

        assert_eq!(verdict.category, Category::ManualReview);
        assert!((verdict.confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(verdict.reasoning, "Low confidence (0.50 < 0.8): Unsure");
    }

    #[tokio::test]
    async fn test_confidence_at_threshold_is_accepted() {
        let verdict = classifier(r#"{"category": "routine", "confidence": 0.8, "reasoning": "ok"}"#)
            .classify(&change())
            .await;
        assert_eq!(verdict.category, Category::Routine);
    }

    #[tokio::test]
    async fn test_confidence_is_clamped() {
        let verdict = classifier(r#"{"category": "IMPACT", "confidence": 7, "reasoning": "boundary"}"#)
            .classify(&change())
            .await;
        assert_eq!(verdict.category, Category::Impact);
        assert!((verdict.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let verdict = classifier("I think this is adaptive").classify(&change()).await;
        assert_eq!(verdict.category, Category::ManualReview);
        assert!(verdict.confidence.abs() < f64::EPSILON);
        assert!(verdict.reasoning.starts_with("AI returned invalid JSON:"));
    }

    #[tokio::test]
    async fn test_missing_and_mistyped_fields() {
        for reply in [
            r#"{"confidence": 0.9, "reasoning": "x"}"#,
            r#"{"category": "ADAPTIVE", "confidence": "high", "reasoning": "x"}"#,
            r#"{"category": "ADAPTIVE", "confidence": 0.9}"#,
            r#"{"category": "SEVERE", "confidence": 0.9, "reasoning": "x"}"#,
            r#"["ADAPTIVE"]"#,
        ] {
            let verdict = classifier(reply).classify(&change()).await;
            assert_eq!(verdict.category, Category::ManualReview, "{reply}");
            assert!(verdict.reasoning.starts_with("AI response parse error:"), "{reply}");
        }
    }

    #[tokio::test]
    async fn test_code_fenced_answer() {
        let reply = "```json\n{\"category\": \"TRANSFORMATIVE\", \"confidence\": 0.85, \"reasoning\": \"Region\"}\n```";
        let verdict = classifier(reply).classify(&change()).await;
        assert_eq!(verdict.category, Category::Transformative);
    }

    #[tokio::test]
    async fn test_transport_error() {
        let ai = AiClassifier::with_provider(config(), Box::new(StubProvider::failing("connection reset")));
        let verdict = ai.classify(&change()).await;

        assert_eq!(verdict.category, Category::ManualReview);
        assert!(verdict.reasoning.starts_with("AI API error:"));
        assert!(verdict.reasoning.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_prompt_carries_change_details() {
        let stub = StubProvider::replying(
            r#"{"category": "ROUTINE", "confidence": 1.0, "reasoning": "x"}"#,
        );
        let prompts = Arc::clone(&stub.prompts);

        AiClassifier::with_provider(config(), Box::new(stub))
            .classify(&change())
            .await;

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("- Resource Name: worker"));
        assert!(prompts[0].contains("- Attributes Changed: memory_size"));
    }

    #[tokio::test]
    async fn test_unavailable_without_key() {
        let ai = AiClassifier::from_config_with(&config(), None, |_| None);
        assert!(!ai.is_available());

        let verdict = ai.classify(&change()).await;
        assert_eq!(verdict.category, Category::ManualReview);
        assert!(verdict.confidence.abs() < f64::EPSILON);
        assert_eq!(
            verdict.reasoning,
            "AI fallback not available (no API key, set ANTHROPIC_API_KEY)"
        );
    }

    #[tokio::test]
    async fn test_unavailable_without_provider_or_model() {
        let no_provider = AiConfig {
            provider: None,
            ..config()
        };
        let ai = AiClassifier::from_config_with(&no_provider, Some("key"), |_| None);
        let verdict = ai.classify(&change()).await;
        assert_eq!(
            verdict.reasoning,
            "AI fallback not available (no provider configured)"
        );

        let no_model = AiConfig {
            model: None,
            ..config()
        };
        let ai = AiClassifier::from_config_with(&no_model, Some("key"), |_| None);
        assert!(!ai.is_available());
        assert_eq!(ai.model(), None);
    }

    #[tokio::test]
    async fn test_unavailable_with_unknown_provider() {
        let gemini = AiConfig {
            provider: Some(String::from("gemini")),
            ..config()
        };
        let ai = AiClassifier::from_config_with(&gemini, Some("key"), |_| None);
        assert!(matches!(
            ai.provider,
            Err(AiError::UnknownProvider { ref name, .. }) if name == "gemini"
        ));

        let verdict = ai.classify(&change()).await;
        assert_eq!(
            verdict.reasoning,
            "AI fallback not available (unknown provider 'gemini', supported: anthropic, openai)"
        );
    }

    #[test]
    fn test_available_with_explicit_key() {
        let ai = AiClassifier::from_config_with(&config(), Some("sk-explicit"), |_| None);
        assert!(ai.is_available());
        assert_eq!(ai.model(), Some("claude-test"));
    }
}
