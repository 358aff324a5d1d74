//! Local inference daemon provider
//!
//! Talks to an Ollama-compatible daemon on localhost. The daemon's model
//! listing drives the availability probe: a listed model is usable, a model
//! mid-pull reports `downloading`, and an unknown model needs an explicit
//! download the user has to trigger from settings — this provider never
//! starts a pull on its own.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{cancelled_or_pending, ModelBackend, ModelSession};
use crate::error::{AbortReason, ProviderError, Result};
use crate::models::{AiConfig, Availability, PromptOptions};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Local daemon backend
pub struct LocalProvider {
    model: String,
    base_url: String,
    client: Arc<Client>,
}

impl LocalProvider {
    /// Create a provider for a named local model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Arc::new(Client::new()),
        }
    }

    /// Override the daemon address
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ModelBackend for LocalProvider {
    fn id(&self) -> &str {
        "local"
    }

    async fn availability(&self) -> Result<Availability> {
        let response = match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "local model daemon unreachable");
                return Ok(Availability::Unavailable);
            }
        };
        if !response.status().is_success() {
            return Ok(Availability::Unavailable);
        }
        let tags: ModelTags = response.json().await?;
        Ok(map_tags_to_availability(&tags, &self.model))
    }

    async fn create_session(&self, config: &AiConfig) -> Result<Box<dyn ModelSession>> {
        Ok(Box::new(LocalSession {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            config: config.clone(),
        }))
    }
}

struct LocalSession {
    model: String,
    base_url: String,
    client: Arc<Client>,
    config: AiConfig,
}

#[async_trait]
impl ModelSession for LocalSession {
    async fn prompt(&self, text: &str, options: &PromptOptions) -> Result<String> {
        let body = build_generate_body(text, &self.config, &self.model, options);
        let request = self
            .client
            .post(format!("{}/api/generate", self.base_url))
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

        let decoded: GenerateResponse = response.json().await?;
        let content = decoded.response.trim_end().to_string();
        if content.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }

    async fn try_clone(&self) -> Option<Box<dyn ModelSession>> {
        // The daemon keeps per-model context server-side; there is no
        // cheap fork operation, so callers reuse the base session.
        None
    }

    async fn destroy(&self) {
        debug!(model = %self.model, "local session released");
    }
}

#[derive(Debug, Deserialize)]
struct ModelTags {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
    /// "ready" once fully pulled; "downloading" while a pull is in flight
    #[serde(default)]
    status: Option<String>,
}

fn map_tags_to_availability(tags: &ModelTags, model: &str) -> Availability {
    let entry = tags
        .models
        .iter()
        .find(|tag| tag.name == model || tag.name.starts_with(&format!("{model}:")));
    match entry {
        Some(tag) if tag.status.as_deref() == Some("downloading") => Availability::Downloading,
        Some(_) => Availability::Available,
        None => Availability::NeedsDownload,
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    options: GenerateOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_k: u32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

fn build_generate_body(
    text: &str,
    config: &AiConfig,
    model: &str,
    options: &PromptOptions,
) -> GenerateBody {
    GenerateBody {
        model: model.to_string(),
        prompt: text.to_string(),
        stream: false,
        system: config.system_prompt.clone(),
        options: GenerateOptions {
            temperature: config.temperature,
            top_k: config.top_k,
            num_predict: config.max_tokens,
        },
        format: options.response_constraint.clone(),
    }
}
