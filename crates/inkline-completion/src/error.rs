//! Engine-level error type
//!
//! Callers of the engine see a small set of actionable failures: the model
//! needs attention (download, credentials, outage), the request took too
//! long, or the caller itself cancelled. Supersession is not represented
//! here at all; a superseded request resolves to an empty suggestion list.

use thiserror::Error;

use inkline_providers::{AbortReason, ProviderError};

/// Errors surfaced by [`crate::CompletionEngine`]
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The model must be downloaded before completions can be served
    #[error("model download required before completions can be served")]
    NeedsDownload,

    /// A model download is already in progress
    #[error("model download in progress")]
    Downloading,

    /// The backend cannot serve sessions at all
    #[error("model unavailable: {message}")]
    Unavailable { message: String },

    /// The backend did not respond within the deadline
    #[error("completion timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The caller cancelled the request
    #[error("completion cancelled by caller")]
    Cancelled,

    /// Any other backend failure
    #[error(transparent)]
    Provider(ProviderError),
}

impl From<ProviderError> for CompletionError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::NeedsDownload => Self::NeedsDownload,
            ProviderError::Downloading => Self::Downloading,
            ProviderError::Unavailable { reason } => Self::Unavailable { message: reason },
            ProviderError::MissingCredentials { message } => Self::Unavailable { message },
            ProviderError::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            ProviderError::Aborted {
                reason: AbortReason::External,
            } => Self::Cancelled,
            // Supersession is handled by the engine before conversion; if
            // one leaks through it still reads as a cancellation.
            ProviderError::Aborted {
                reason: AbortReason::Superseded,
            } => Self::Cancelled,
            ProviderError::Aborted {
                reason: AbortReason::Timeout,
            } => Self::Timeout { timeout_ms: 0 },
            other => Self::Provider(other),
        }
    }
}
