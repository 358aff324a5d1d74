//! Provider-facing error taxonomy

use thiserror::Error;

/// Why an in-flight backend call was aborted.
///
/// Exactly one reason is recorded per call; whichever trigger fires first
/// wins and later triggers are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The configured response deadline elapsed
    Timeout,
    /// The caller's cancellation signal fired
    External,
    /// A newer completion request superseded this one
    Superseded,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AbortReason::Timeout => "timeout",
            AbortReason::External => "external",
            AbortReason::Superseded => "superseded",
        };
        f.write_str(label)
    }
}

/// Backend call errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("model not available: {reason}")]
    Unavailable { reason: String },

    /// The backend has a model it could fetch but has not been asked to.
    /// Downloads are never triggered automatically; the user opts in.
    #[error("model needs download")]
    NeedsDownload,

    #[error("model download already in progress")]
    Downloading,

    #[error("missing credentials: {message}")]
    MissingCredentials { message: String },

    #[error("backend call timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("backend call aborted ({reason})")]
    Aborted { reason: AbortReason },

    #[error("backend returned an empty response")]
    EmptyResponse,

    #[error("api error: status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed backend response: {message}")]
    MalformedResponse { message: String },
}

impl ProviderError {
    /// Whether this error represents a cancelled or timed-out call rather
    /// than a backend failure
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout { .. } | ProviderError::Aborted { .. }
        )
    }
}

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, ProviderError>;
