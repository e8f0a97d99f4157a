//! AI provider abstraction and registry.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::anthropic::AnthropicProvider;
use super::openai::OpenAiProvider;
use crate::error::{AiError, Result};

/// Request timeout for provider calls, in seconds.
pub const PROVIDER_TIMEOUT_SECS: u64 = 30;

/// A chat-completion backend that turns a prompt into assistant text.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Returns the registry name of the provider.
    fn name(&self) -> &'static str;

    /// Sends the prompt and returns the assistant's text.
    async fn call(&self, prompt: &str) -> Result<String>;
}

/// Registered provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI Chat Completions API and compatible endpoints.
    OpenAi,
}

impl ProviderKind {
    /// All registered providers.
    pub const ALL: [Self; 2] = [Self::Anthropic, Self::OpenAi];

    /// Looks up a provider by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Looks up a provider by name, failing with the list of registered ones.
    ///
    /// # Errors
    ///
    /// Returns `AiError::UnknownProvider` if the name is not registered.
    pub fn lookup(name: &str) -> std::result::Result<Self, AiError> {
        Self::from_name(name).ok_or_else(|| AiError::UnknownProvider {
            name: name.to_string(),
            supported: Self::supported_names(),
        })
    }

    /// Returns the configuration name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    /// Returns the environment variable holding the provider's API key.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Returns the default API base URL.
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Returns the registered names, comma separated.
    #[must_use]
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection settings shared by all providers.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// API key sent with every request.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Token limit for the response.
    pub max_tokens: u32,
    /// API base URL; the provider default when `None`.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ProviderSettings {
    /// Creates settings with the default base URL and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            base_url: None,
            timeout_secs: PROVIDER_TIMEOUT_SECS,
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url.filter(|url| !url.trim().is_empty());
        self
    }

    /// Returns the base URL for `kind` without a trailing slash.
    #[must_use]
    pub fn base_url_for(&self, kind: ProviderKind) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| kind.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Builds the HTTP client used by providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn http_client(&self) -> std::result::Result<Client, AiError> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| AiError::network(format!("Failed to create HTTP client: {e}")))
    }
}

/// Resolves the API key for a provider: the explicit key if non-empty,
/// otherwise the provider's environment variable.
#[must_use]
pub fn resolve_api_key(kind: ProviderKind, explicit: Option<&str>) -> Option<String> {
    resolve_api_key_with(kind, explicit, |name| std::env::var(name).ok())
}

/// Like [`resolve_api_key`] with a custom environment lookup.
pub fn resolve_api_key_with<F>(kind: ProviderKind, explicit: Option<&str>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .filter(|key| !key.is_empty())
        .map(String::from)
        .or_else(|| lookup(kind.env_var()))
        .filter(|key| !key.is_empty())
}

/// Creates a provider by kind.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created.
pub fn create_provider(
    kind: ProviderKind,
    settings: ProviderSettings,
) -> std::result::Result<Box<dyn AiProvider>, AiError> {
    Ok(match kind {
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(settings)?),
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(settings)?),
    })
}

/// Maps a reqwest send error onto the AI error taxonomy.
pub(crate) fn map_send_error(error: &reqwest::Error, timeout_secs: u64) -> AiError {
    if error.is_timeout() {
        AiError::Timeout { timeout_secs }
    } else {
        AiError::network(format!("Request failed: {error}"))
    }
}

/// Maps a non-success HTTP status onto the AI error taxonomy.
pub(crate) fn map_status_error(status: reqwest::StatusCode, body: String) -> AiError {
    match status.as_u16() {
        401 | 403 => AiError::AuthenticationFailed {
            message: String::from("Invalid API key"),
        },
        code => AiError::api_error(code, body),
    }
}
