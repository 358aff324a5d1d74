//! Capability traits implemented by every model backend

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AiConfig, Availability, PromptOptions};

/// A completion model backend.
///
/// Backends create sessions; they do not answer prompts directly. Session
/// creation is the expensive operation the session manager amortizes.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short identifier for logging ("remote", "local", "stub")
    fn id(&self) -> &str;

    /// Probe whether the backend can create sessions right now.
    ///
    /// Implementations must report [`Availability::NeedsDownload`] rather
    /// than starting a model fetch themselves.
    async fn availability(&self) -> Result<Availability>;

    /// Create a fresh session for the given configuration
    async fn create_session(&self, config: &AiConfig) -> Result<Box<dyn ModelSession>>;
}

/// A stateful handle to the completion backend.
///
/// Sessions may accumulate conversational state across prompts, which is why
/// the session manager prefers to derive a disposable clone per prompt.
#[async_trait]
pub trait ModelSession: Send + Sync {
    /// Issue a prompt and return the raw model output.
    ///
    /// Implementations must observe `options.cancellation` promptly; the
    /// session manager hands every call a token it may fire at any moment.
    async fn prompt(&self, text: &str, options: &PromptOptions) -> Result<String>;

    /// Derive a disposable copy of this session, if the backend supports
    /// cloning. `None` signals "unsupported or failed"; callers fall back
    /// to the base session.
    async fn try_clone(&self) -> Option<Box<dyn ModelSession>>;

    /// Release backend resources held by this session. Idempotent.
    async fn destroy(&self);
}

/// Resolve a cancellation future for an optional token; absent tokens never
/// fire.
pub(crate) async fn cancelled_or_pending(
    token: Option<&tokio_util::sync::CancellationToken>,
) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}
