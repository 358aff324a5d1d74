//! Configuration and per-call option types shared by all backends

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Readiness of a backend's model.
///
/// Mirrors the four distinguishable outcomes of session creation: the model
/// is usable, it exists but must be fetched first, a fetch is already
/// running, or the backend cannot serve at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    NeedsDownload,
    Downloading,
    Unavailable,
}

/// Output language requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLanguage {
    En,
    Es,
    Ja,
}

impl std::fmt::Display for OutputLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            OutputLanguage::En => "en",
            OutputLanguage::Es => "es",
            OutputLanguage::Ja => "ja",
        };
        f.write_str(code)
    }
}

/// Model sampling configuration.
///
/// Supplied by configuration collaborators and treated as immutable by the
/// core. Sessions are keyed by this configuration (plus a scope), so two
/// distinct configurations never share a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Sampling temperature in `[0, 1]`
    pub temperature: f32,
    /// Top-k sampling cutoff, at least 1
    pub top_k: u32,
    /// Maximum tokens the model may produce per prompt
    pub max_tokens: u32,
    /// Optional system prompt installed at session creation
    pub system_prompt: Option<String>,
    /// Preferred output language; `None` lets the backend decide
    pub output_language: Option<OutputLanguage>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 3,
            max_tokens: 256,
            system_prompt: None,
            output_language: None,
        }
    }
}

impl AiConfig {
    /// Stable identity string for session keying.
    ///
    /// Two configs with equal signatures are interchangeable for session
    /// reuse purposes.
    pub fn signature(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.temperature,
            self.top_k,
            self.max_tokens,
            self.system_prompt.as_deref().unwrap_or(""),
            self.output_language
                .map(|lang| lang.to_string())
                .unwrap_or_else(|| "auto".to_string()),
        )
    }
}

/// Options for a single backend prompt call
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Response deadline; `None` falls back to the session manager default
    /// (10 seconds)
    pub timeout: Option<Duration>,
    /// Scope string tying the session to a page/document context
    pub session_scope: Option<String>,
    /// JSON schema the backend should constrain its output to
    pub response_constraint: Option<serde_json::Value>,
    /// Caller-supplied cancellation signal (e.g. the suggestion UI was
    /// dismissed)
    pub cancellation: Option<CancellationToken>,
    /// Orchestrator-internal token fired when a newer request supersedes
    /// this one
    pub supersession: Option<CancellationToken>,
}
