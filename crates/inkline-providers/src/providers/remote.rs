//! Remote chat-completions provider
//!
//! Speaks the OpenAI-style `/chat/completions` wire shape. The structured
//! response constraint, when present, is forwarded as a strict
//! `json_schema` response format so the model answers with the
//! `{ "suggestions": [...] }` object the parser expects.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{cancelled_or_pending, ModelBackend, ModelSession};
use crate::error::{AbortReason, ProviderError, Result};
use crate::models::{AiConfig, Availability, PromptOptions};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Remote chat-completions backend
pub struct RemoteProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Arc<Client>,
}

impl RemoteProvider {
    /// Create a provider for the default endpoint and model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// Create a provider with an explicit model identifier
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Arc::new(Client::new()),
        }
    }

    /// Override the API base URL (proxies, compatible gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ModelBackend for RemoteProvider {
    fn id(&self) -> &str {
        "remote"
    }

    async fn availability(&self) -> Result<Availability> {
        if self.api_key.is_empty() {
            return Ok(Availability::Unavailable);
        }
        // Remote models have no download lifecycle; a keyed provider is
        // assumed reachable until a call says otherwise.
        Ok(Availability::Available)
    }

    async fn create_session(&self, config: &AiConfig) -> Result<Box<dyn ModelSession>> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredentials {
                message: "remote provider requires an API key".to_string(),
            });
        }
        Ok(Box::new(RemoteSession {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            config: config.clone(),
        }))
    }
}

struct RemoteSession {
    api_key: String,
    model: String,
    base_url: String,
    client: Arc<Client>,
    config: AiConfig,
}

#[async_trait]
impl ModelSession for RemoteSession {
    async fn prompt(&self, text: &str, options: &PromptOptions) -> Result<String> {
        let body = build_chat_body(text, &self.config, &self.model, options);
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = tokio::select! {
            response = request => response?,
            _ = cancelled_or_pending(options.cancellation.as_ref()) => {
                return Err(ProviderError::Aborted { reason: AbortReason::External });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: ChatCompletionsResponse = response.json().await?;
        extract_completion_text(&decoded)
    }

    async fn try_clone(&self) -> Option<Box<dyn ModelSession>> {
        // Remote sessions carry no server-side state, so a clone is a plain
        // copy of the request parameters.
        Some(Box::new(RemoteSession {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            config: self.config.clone(),
        }))
    }

    async fn destroy(&self) {
        debug!(model = %self.model, "remote session released");
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaBody,
}

#[derive(Debug, Serialize)]
struct JsonSchemaBody {
    name: &'static str,
    schema: serde_json::Value,
    strict: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequestBody {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonSchemaFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn build_chat_body(
    text: &str,
    config: &AiConfig,
    model: &str,
    options: &PromptOptions,
) -> ChatRequestBody {
    let mut messages = Vec::new();
    if let Some(system_prompt) = &config.system_prompt {
        messages.push(ChatMessage {
            role: "system",
            content: system_prompt.clone(),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: text.to_string(),
    });

    ChatRequestBody {
        model: model.to_string(),
        messages,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        response_format: options.response_constraint.clone().map(|schema| {
            JsonSchemaFormat {
                kind: "json_schema",
                json_schema: JsonSchemaBody {
                    name: "CompletionSuggestions",
                    schema,
                    strict: true,
                },
            }
        }),
    }
}

fn extract_completion_text(response: &ChatCompletionsResponse) -> Result<String> {
    let content = response
        .choices
        .first()
        .and_then(|choice| choice.message.as_ref())
        .and_then(|message| message.content.as_deref())
        .map(|content| content.trim_end().to_string())
        .unwrap_or_default();
    if content.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(content)
}
