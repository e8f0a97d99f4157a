//! Anthropic Messages API provider.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::provider::{AiProvider, ProviderKind, ProviderSettings, map_send_error, map_status_error};
use crate::error::{AiError, Result};

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Calls `POST {base}/v1/messages`.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(settings: ProviderSettings) -> std::result::Result<Self, AiError> {
        let client = settings.http_client()?;
        let endpoint = format!("{}/v1/messages", settings.base_url_for(ProviderKind::Anthropic));
        Ok(Self {
            client,
            settings,
            endpoint,
        })
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        ProviderKind::Anthropic.name()
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Calling Anthropic model {}", self.settings.model);
        trace!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error(&e, self.settings.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body).into());
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(format!("Failed to parse response: {e}")))?;

        body.content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| AiError::invalid_response("No text content in response").into())
    }
}
