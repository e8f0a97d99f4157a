//! OpenAI Chat Completions provider.
//!
//! Also works with OpenAI-compatible endpoints (Azure `OpenAI`, Ollama, vLLM)
//! through `api_base_url`.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::provider::{AiProvider, ProviderKind, ProviderSettings, map_send_error, map_status_error};
use crate::error::{AiError, Result};

/// Calls `POST {base}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    settings: ProviderSettings,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Creates a new `OpenAI` provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(settings: ProviderSettings) -> std::result::Result<Self, AiError> {
        let client = settings.http_client()?;
        let endpoint = format!("{}/chat/completions", settings.base_url_for(ProviderKind::OpenAi));
        Ok(Self {
            client,
            settings,
            endpoint,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        ProviderKind::OpenAi.name()
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Calling OpenAI model {}", self.settings.model);
        trace!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
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

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(format!("Failed to parse response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::invalid_response("No message content in response").into())
    }
}
