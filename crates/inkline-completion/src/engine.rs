//! Completion request lifecycle orchestration

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use inkline_cache::CompletionCache;
use inkline_providers::{
    AbortReason, AdmissionQueue, ModelBackend, PromptOptions, ProviderError,
};
use inkline_sessions::{derive_session_scope, SessionManager};

use crate::config::{CompletionOptions, EngineConfig};
use crate::error::CompletionError;
use crate::overlap::trim_suggestions;
use crate::parser::{parse_structured, suggestion_constraint};
use crate::prompt::{InsertionPromptBuilder, PromptAssembler};
use crate::ranker::SuggestionRanker;
use crate::types::{CompletionRequest, CompletionSuggestion};
use crate::Result;

/// Orchestrates a completion request from trigger to ranked suggestions.
///
/// One engine serves the whole process. Every request flows through the
/// same stages: supersede any in-flight request, consult the cache, send
/// one admission-controlled prompt through a warm session, then parse,
/// reconcile, rank, and cache the result.
pub struct CompletionEngine {
    config: EngineConfig,
    cache: CompletionCache<Vec<CompletionSuggestion>>,
    queue: AdmissionQueue,
    sessions: SessionManager,
    ranker: SuggestionRanker,
    prompts: Arc<dyn PromptAssembler>,
    /// Supersession token of the newest request; replaced (and the old one
    /// cancelled) every time a request begins.
    in_flight: Mutex<Option<CancellationToken>>,
}

impl CompletionEngine {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    pub fn with_config(backend: Arc<dyn ModelBackend>, config: EngineConfig) -> Self {
        Self {
            config,
            cache: CompletionCache::new(),
            queue: AdmissionQueue::new(),
            sessions: SessionManager::new(backend),
            ranker: SuggestionRanker::new(),
            prompts: Arc::new(InsertionPromptBuilder::new()),
            in_flight: Mutex::new(None),
        }
    }

    /// Swap in a different prompt assembly strategy
    pub fn with_prompt_assembler(mut self, prompts: Arc<dyn PromptAssembler>) -> Self {
        self.prompts = prompts;
        self
    }

    /// Serve one completion request.
    ///
    /// Starting a request cancels any still-running one; the superseded
    /// call resolves to `Ok` with an empty list and leaves the cache
    /// untouched. A cache hit returns immediately without contacting the
    /// backend.
    pub async fn generate_completions(
        &self,
        request: &CompletionRequest,
        options: &CompletionOptions,
    ) -> Result<Vec<CompletionSuggestion>> {
        let supersession = self.begin_request();

        let fingerprint = request.fingerprint();
        if let Some(cached) = self.cache.get(&fingerprint) {
            debug!(%fingerprint, "serving suggestions from cache");
            return Ok(cached);
        }

        let max_suggestions = options.max_suggestions.unwrap_or(self.config.max_suggestions);
        let assembled = self
            .prompts
            .assemble(request, self.config.ai_config.max_tokens);

        let prompt_options = PromptOptions {
            timeout: Some(
                options
                    .response_timeout
                    .unwrap_or(self.config.response_timeout),
            ),
            session_scope: Some(assembled.session_scope),
            response_constraint: Some(suggestion_constraint(max_suggestions)),
            cancellation: options.cancellation.clone(),
            supersession: Some(supersession),
        };

        let raw = match self
            .queue
            .execute(self.sessions.prompt_with_session(
                &assembled.text,
                &self.config.ai_config,
                &prompt_options,
            ))
            .await
        {
            Ok(raw) => raw,
            Err(ProviderError::Aborted {
                reason: AbortReason::Superseded,
            }) => {
                debug!(%fingerprint, "request superseded by a newer one");
                return Ok(Vec::new());
            }
            Err(error) => return Err(CompletionError::from(error)),
        };

        let candidates = parse_structured(&raw).unwrap_or_else(|| vec![raw]);
        let reconciled = trim_suggestions(
            request.text_before_cursor(),
            &candidates,
            request.text_after_cursor(),
        );
        let ranked = self.ranker.rank(&reconciled, max_suggestions);

        self.cache.set(&fingerprint, ranked.clone());
        Ok(ranked)
    }

    /// Pre-create the session that metadata-free requests will use, so the
    /// first real completion skips session setup.
    pub async fn warm_up(&self) -> Result<()> {
        let scope = derive_session_scope(None, None);
        self.sessions
            .acquire(&self.config.ai_config, &scope)
            .await?;
        Ok(())
    }

    /// Tear down idle sessions past their TTL
    pub async fn evict_idle_sessions(&self) {
        self.sessions.evict_idle().await;
    }

    /// Destroy all sessions and drop all cached suggestions
    pub async fn shutdown(&self) {
        self.sessions.shutdown().await;
        self.cache.clear();
    }

    /// Cancel the current in-flight request (if any) and register a new
    /// supersession token for this one.
    fn begin_request(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self.in_flight.lock().replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkline_providers::StubBackend;

    fn engine(backend: &StubBackend) -> CompletionEngine {
        CompletionEngine::new(Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn structured_output_becomes_ranked_suggestions() {
        let backend = StubBackend::new();
        backend.push_response(r#"{"suggestions":[{"text":"Hi"},{"text":"Hello there!"}]}"#);
        let engine = engine(&backend);

        let request = CompletionRequest::new("Say: ", 5);
        let suggestions = engine
            .generate_completions(&request, &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(suggestions[0].text, "Hello there!");
        assert_eq!(suggestions[1].text, "Hi");
    }

    #[tokio::test]
    async fn freeform_output_is_one_candidate() {
        let backend = StubBackend::new();
        backend.push_response("just plain text");
        let engine = engine(&backend);

        let request = CompletionRequest::new("Say: ", 5);
        let suggestions = engine
            .generate_completions(&request, &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].text, "just plain text");
    }

    #[tokio::test]
    async fn identical_requests_hit_the_cache() {
        let backend = StubBackend::new();
        backend.push_response(r#"{"suggestions":[{"text":"cached"}]}"#);
        let engine = engine(&backend);

        let request = CompletionRequest::new("repeat me", 9);
        let first = engine
            .generate_completions(&request, &CompletionOptions::default())
            .await
            .unwrap();
        let second = engine
            .generate_completions(&request, &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn suggestions_overlapping_the_prefix_are_trimmed() {
        let backend = StubBackend::new();
        backend.push_response(r#"{"suggestions":[{"text":"実行結果を見てみます"}]}"#);
        let engine = engine(&backend);

        let text = "次に実行結果を見て";
        let request = CompletionRequest::new(text, text.chars().count());
        let suggestions = engine
            .generate_completions(&request, &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].text, "みます");
    }

    #[tokio::test]
    async fn backend_failure_maps_to_engine_error() {
        let backend = StubBackend::new();
        backend.push_error(ProviderError::EmptyResponse);
        let engine = engine(&backend);

        let request = CompletionRequest::new("text", 4);
        let result = engine
            .generate_completions(&request, &CompletionOptions::default())
            .await;

        assert!(matches!(result, Err(CompletionError::Provider(_))));
        // Failures are never cached; the next call goes to the backend.
        backend.push_response(r#"{"suggestions":[{"text":"recovered"}]}"#);
        let suggestions = engine
            .generate_completions(&request, &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(suggestions[0].text, "recovered");
    }

    #[tokio::test]
    async fn external_cancellation_is_an_error_not_empty() {
        let backend = StubBackend::new();
        let engine = engine(&backend);

        let token = CancellationToken::new();
        token.cancel();
        let options = CompletionOptions {
            cancellation: Some(token),
            ..CompletionOptions::default()
        };

        let request = CompletionRequest::new("text", 4);
        let result = engine.generate_completions(&request, &options).await;
        assert!(matches!(result, Err(CompletionError::Cancelled)));
    }

    #[tokio::test]
    async fn warm_up_creates_the_default_scope_session() {
        let backend = StubBackend::new();
        let engine = engine(&backend);

        engine.warm_up().await.unwrap();
        assert_eq!(backend.sessions_created(), 1);

        // A metadata-free request reuses the warmed session.
        backend.push_response(r#"{"suggestions":[{"text":"warm"}]}"#);
        engine
            .generate_completions(
                &CompletionRequest::new("text", 4),
                &CompletionOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(backend.sessions_created(), 1);
    }

    #[tokio::test]
    async fn shutdown_clears_sessions_and_cache() {
        let backend = StubBackend::new();
        backend.push_response(r#"{"suggestions":[{"text":"gone"}]}"#);
        backend.push_response(r#"{"suggestions":[{"text":"fresh"}]}"#);
        let engine = engine(&backend);

        let request = CompletionRequest::new("text", 4);
        engine
            .generate_completions(&request, &CompletionOptions::default())
            .await
            .unwrap();
        engine.shutdown().await;

        let suggestions = engine
            .generate_completions(&request, &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(suggestions[0].text, "fresh");
        assert_eq!(backend.call_count(), 2);
    }
}
