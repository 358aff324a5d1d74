//! Session manager: registry, idle expiry, per-prompt isolation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use inkline_providers::{
    AbortReason, AiConfig, Availability, ModelBackend, ModelSession, PromptOptions, ProviderError,
};

use crate::abort::AbortGuard;

/// Session manager configuration
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// A session unused for this long is torn down instead of reused
    pub idle_ttl: Duration,
    /// Response deadline applied when a prompt carries no explicit timeout
    pub default_timeout: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(300),     // 5 minutes
            default_timeout: Duration::from_secs(10),
        }
    }
}

struct SessionEntry {
    session: Arc<dyn ModelSession>,
    last_used: Instant,
}

/// Owns live backend sessions, keyed by configuration signature and scope.
///
/// Sessions are expensive to create, so a live session matching the
/// (scope, temperature, top_k, max_tokens, system_prompt, output_language)
/// tuple is reused and its idle clock reset on every acquisition. Distinct
/// tuples never share a session. The registry lock is held across session
/// creation, so reuse-or-create is atomic with respect to concurrent
/// acquisitions of the same key.
pub struct SessionManager {
    backend: Arc<dyn ModelBackend>,
    config: SessionManagerConfig,
    registry: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self::with_config(backend, SessionManagerConfig::default())
    }

    pub fn with_config(backend: Arc<dyn ModelBackend>, config: SessionManagerConfig) -> Self {
        Self {
            backend,
            config,
            registry: Mutex::new(HashMap::new()),
        }
    }

    fn session_key(config: &AiConfig, scope: &str) -> String {
        format!("{scope}:{}", config.signature())
    }

    /// Get a live session for the configuration and scope, creating one
    /// through the backend if necessary. Reuse bumps the idle clock; an
    /// idle-expired session is destroyed and replaced.
    pub async fn acquire(
        &self,
        config: &AiConfig,
        scope: &str,
    ) -> Result<Arc<dyn ModelSession>, ProviderError> {
        let mut registry = self.registry.lock().await;
        let key = Self::session_key(config, scope);
        let now = Instant::now();

        if let Some(entry) = registry.get_mut(&key) {
            if now.duration_since(entry.last_used) <= self.config.idle_ttl {
                entry.last_used = now;
                return Ok(entry.session.clone());
            }
            if let Some(stale) = registry.remove(&key) {
                debug!(%key, "tearing down idle-expired session");
                stale.session.destroy().await;
            }
        }

        let session: Arc<dyn ModelSession> = Arc::from(self.create_session(config).await?);
        registry.insert(
            key,
            SessionEntry {
                session: session.clone(),
                last_used: Instant::now(),
            },
        );
        Ok(session)
    }

    async fn create_session(
        &self,
        config: &AiConfig,
    ) -> Result<Box<dyn ModelSession>, ProviderError> {
        match self.backend.availability().await? {
            Availability::Available => {}
            // Downloads are an explicit user action in settings; the
            // manager only reports that one is needed or running.
            Availability::NeedsDownload => return Err(ProviderError::NeedsDownload),
            Availability::Downloading => return Err(ProviderError::Downloading),
            Availability::Unavailable => {
                warn!(backend = self.backend.id(), "backend unavailable");
                return Err(ProviderError::Unavailable {
                    reason: format!("backend '{}' cannot serve sessions", self.backend.id()),
                });
            }
        }
        self.backend.create_session(config).await
    }

    /// Issue one prompt against a session for `config` and the scope in
    /// `options`, isolating it with a disposable clone when the backend
    /// supports cloning.
    ///
    /// The call is bound to a fresh [`AbortGuard`]; whichever of timeout,
    /// external cancellation, or supersession fires first determines the
    /// error. A clone is destroyed on every exit path.
    pub async fn prompt_with_session(
        &self,
        text: &str,
        config: &AiConfig,
        options: &PromptOptions,
    ) -> Result<String, ProviderError> {
        let scope = options.session_scope.as_deref().unwrap_or("global");
        let base = self.acquire(config, scope).await?;

        let clone = base.try_clone().await;
        if clone.is_none() {
            debug!("session clone unavailable; prompting against the base session");
        }

        let guard = AbortGuard::new();
        let timeout = options.timeout.unwrap_or(self.config.default_timeout);
        let timeout_ms = timeout.as_millis() as u64;

        // Pre-aborted signals short-circuit before the backend is touched.
        if options
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            guard.trip(AbortReason::External);
            return Err(guard.classify(timeout_ms));
        }
        if options
            .supersession
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            guard.trip(AbortReason::Superseded);
            return Err(guard.classify(timeout_ms));
        }

        let mut call_options = options.clone();
        call_options.cancellation = Some(guard.token());
        call_options.supersession = None;

        let result = {
            let working: &dyn ModelSession = match &clone {
                Some(cloned) => cloned.as_ref(),
                None => base.as_ref(),
            };
            let prompt = working.prompt(text, &call_options);
            tokio::pin!(prompt);
            tokio::select! {
                result = &mut prompt => {
                    result.map_err(|error| guard.reclassify(error, timeout_ms))
                }
                _ = tokio::time::sleep(timeout) => {
                    guard.trip(AbortReason::Timeout);
                    Err(guard.classify(timeout_ms))
                }
                _ = cancelled(options.cancellation.as_ref()) => {
                    guard.trip(AbortReason::External);
                    Err(guard.classify(timeout_ms))
                }
                _ = cancelled(options.supersession.as_ref()) => {
                    guard.trip(AbortReason::Superseded);
                    Err(guard.classify(timeout_ms))
                }
            }
        };

        if let Some(cloned) = clone {
            cloned.destroy().await;
        }
        result
    }

    /// Tear down every session idle longer than the configured TTL
    pub async fn evict_idle(&self) {
        let mut registry = self.registry.lock().await;
        let now = Instant::now();
        let expired: Vec<String> = registry
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_used) > self.config.idle_ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            if let Some(entry) = registry.remove(&key) {
                debug!(%key, "evicting idle session");
                entry.session.destroy().await;
            }
        }
    }

    /// Destroy all live sessions and empty the registry
    pub async fn shutdown(&self) {
        let mut registry = self.registry.lock().await;
        for (_, entry) in registry.drain() {
            entry.session.destroy().await;
        }
    }

    /// Number of live sessions in the registry
    pub async fn live_sessions(&self) -> usize {
        self.registry.lock().await.len()
    }
}

async fn cancelled(token: Option<&tokio_util::sync::CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}
