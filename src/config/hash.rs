//! Configuration fingerprinting.
//!
//! Every classification report carries a hash of the rules and AI policy
//! that produced it, so two reports can be compared for "same rules, same
//! answers" without shipping the whole profile around.

use sha2::{Digest, Sha256};

use super::spec::{AiConfig, Rule, ScnConfig};

/// Hasher for computing configuration fingerprints.
#[derive(Debug, Default)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new configuration hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the fingerprint of everything that influences classification.
    ///
    /// Profile metadata and notification texts are excluded.
    #[must_use]
    pub fn hash_config(&self, config: &ScnConfig) -> String {
        let mut hasher = Sha256::new();

        hasher.update(config.version.as_bytes());

        for (category, rule) in config.rules.iter_ordered() {
            hasher.update(category.key().as_bytes());
            hasher.update(self.hash_rule(rule).as_bytes());
        }

        if let Some(ai) = &config.ai_fallback {
            Self::update_ai(&mut hasher, ai);
        }

        hex::encode(hasher.finalize())
    }

    /// Computes the hash of a single rule.
    #[must_use]
    pub fn hash_rule(&self, rule: &Rule) -> String {
        let mut hasher = Sha256::new();

        // Field tags keep `pattern: a` distinct from `resource: a`.
        for (tag, value) in [
            ("p", &rule.pattern),
            ("r", &rule.resource),
            ("a", &rule.attribute),
            ("o", &rule.operation),
        ] {
            if let Some(value) = value {
                hasher.update(tag.as_bytes());
                hasher.update(value.as_bytes());
                hasher.update([0u8]);
            }
        }
        hasher.update(rule.description.as_bytes());

        hex::encode(hasher.finalize())
    }

    fn update_ai(hasher: &mut Sha256, ai: &AiConfig) {
        hasher.update([u8::from(ai.enabled)]);
        if let Some(provider) = &ai.provider {
            hasher.update(provider.as_bytes());
        }
        if let Some(model) = &ai.model {
            hasher.update(model.as_bytes());
        }
        hasher.update(ai.confidence_threshold.to_be_bytes());
        hasher.update(ai.max_tokens.to_be_bytes());
        hasher.update(ai.effective_max_diff_chars().to_be_bytes());
        hasher.update(ai.system_prompt.as_bytes());
        hasher.update(ai.user_prompt_template.as_bytes());
    }

    /// Returns a short hash (first 12 characters) for display.
    #[must_use]
    pub fn short_hash(hash: &str) -> &str {
        hash.get(..12).unwrap_or(hash)
    }
}
