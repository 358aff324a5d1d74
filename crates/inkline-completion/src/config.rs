//! Engine configuration and per-call options

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use inkline_providers::AiConfig;

/// Completion engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on suggestions returned per request
    pub max_suggestions: usize,
    /// Default backend response deadline
    pub response_timeout: Duration,
    /// Model sampling configuration; part of the session identity
    pub ai_config: AiConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 3,
            response_timeout: Duration::from_secs(10),
            ai_config: AiConfig::default(),
        }
    }
}

/// Per-call overrides for a completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Override the engine's response deadline
    pub response_timeout: Option<Duration>,
    /// Override the engine's suggestion cap
    pub max_suggestions: Option<usize>,
    /// Caller-supplied cancellation signal, fired e.g. when the hosting UI
    /// dismisses the suggestion overlay
    pub cancellation: Option<CancellationToken>,
}
