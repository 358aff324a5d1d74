//! Scripted in-process backend for tests
//!
//! Deterministic stand-in for a real model: responses are queued up front,
//! prompt latency is simulated with a virtual-time sleep, and every
//! lifecycle event (session creation, prompt attempts, clone destruction)
//! is counted so tests can assert on backend traffic.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::backend::{cancelled_or_pending, ModelBackend, ModelSession};
use crate::error::{AbortReason, ProviderError, Result};
use crate::models::{AiConfig, Availability, PromptOptions};

#[derive(Default)]
struct StubState {
    availability: Mutex<Option<Availability>>,
    responses: Mutex<VecDeque<Result<String>>>,
    prompt_delay: Mutex<Duration>,
    clone_supported: Mutex<bool>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicUsize,
    sessions_created: AtomicUsize,
    clones_destroyed: AtomicUsize,
}

/// Scripted backend; cheap to clone, all clones share one script and one
/// set of counters
#[derive(Clone)]
pub struct StubBackend {
    state: Arc<StubState>,
}

impl StubBackend {
    /// Available backend with clone support, zero latency and no queued
    /// responses
    pub fn new() -> Self {
        let backend = Self {
            state: Arc::new(StubState::default()),
        };
        *backend.state.availability.lock() = Some(Availability::Available);
        *backend.state.clone_supported.lock() = true;
        backend
    }

    /// Fix the availability probe result
    pub fn with_availability(self, availability: Availability) -> Self {
        *self.state.availability.lock() = Some(availability);
        self
    }

    /// Disable session cloning to exercise the base-session fallback
    pub fn without_cloning(self) -> Self {
        *self.state.clone_supported.lock() = false;
        self
    }

    /// Simulated latency per prompt
    pub fn with_prompt_delay(self, delay: Duration) -> Self {
        *self.state.prompt_delay.lock() = delay;
        self
    }

    /// Queue a successful response
    pub fn push_response(&self, text: impl Into<String>) {
        self.state.responses.lock().push_back(Ok(text.into()));
    }

    /// Queue a failure
    pub fn push_error(&self, error: ProviderError) {
        self.state.responses.lock().push_back(Err(error));
    }

    /// Prompt attempts that reached the backend
    pub fn call_count(&self) -> usize {
        self.state.call_count.load(Ordering::SeqCst)
    }

    /// Sessions created through `create_session`
    pub fn sessions_created(&self) -> usize {
        self.state.sessions_created.load(Ordering::SeqCst)
    }

    /// Cloned sessions that were destroyed after use
    pub fn clones_destroyed(&self) -> usize {
        self.state.clones_destroyed.load(Ordering::SeqCst)
    }

    /// Prompt texts received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().clone()
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelBackend for StubBackend {
    fn id(&self) -> &str {
        "stub"
    }

    async fn availability(&self) -> Result<Availability> {
        Ok(self
            .state
            .availability
            .lock()
            .unwrap_or(Availability::Available))
    }

    async fn create_session(&self, _config: &AiConfig) -> Result<Box<dyn ModelSession>> {
        self.state.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession {
            state: self.state.clone(),
            is_clone: false,
        }))
    }
}

struct StubSession {
    state: Arc<StubState>,
    is_clone: bool,
}

#[async_trait]
impl ModelSession for StubSession {
    async fn prompt(&self, text: &str, options: &PromptOptions) -> Result<String> {
        self.state.call_count.fetch_add(1, Ordering::SeqCst);
        self.state.prompts.lock().push(text.to_string());

        let delay = *self.state.prompt_delay.lock();
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancelled_or_pending(options.cancellation.as_ref()) => {
                    return Err(ProviderError::Aborted { reason: AbortReason::External });
                }
            }
        }

        // Responses are consumed only by prompts that run to completion, so
        // an aborted call does not eat the next caller's answer.
        match self.state.responses.lock().pop_front() {
            Some(result) => result,
            None => Ok("{\"suggestions\":[]}".to_string()),
        }
    }

    async fn try_clone(&self) -> Option<Box<dyn ModelSession>> {
        if !*self.state.clone_supported.lock() {
            return None;
        }
        Some(Box::new(StubSession {
            state: self.state.clone(),
            is_clone: true,
        }))
    }

    async fn destroy(&self) {
        if self.is_clone {
            self.state.clones_destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
