//! AI fallback for changes no rule matches.
//!
//! This module provides:
//! - The [`AiProvider`] trait with Anthropic and `OpenAI` implementations
//! - A provider registry with API key resolution
//! - Prompt templating
//! - The [`AiClassifier`] dispatcher with confidence gating

mod anthropic;
mod classifier;
mod openai;
mod prompt;
mod provider;

pub use anthropic::AnthropicProvider;
pub use classifier::{AiClassifier, AiVerdict};
pub use openai::OpenAiProvider;
pub use prompt::{build_prompt, render_template};
pub use provider::{
    AiProvider, PROVIDER_TIMEOUT_SECS, ProviderKind, ProviderSettings, create_provider,
    resolve_api_key, resolve_api_key_with,
};
