//! Per-call abort guard and classification
//!
//! Every backend call gets a fresh guard wired to three possible triggers:
//! the response timeout, the caller's cancellation signal, and supersession
//! by a newer request. The first trigger to fire records the abort reason
//! and cancels the token handed to the backend; later triggers are no-ops.

use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

use inkline_providers::{AbortReason, ProviderError};

/// Tracks why an in-flight backend call was aborted
#[derive(Debug, Default)]
pub struct AbortGuard {
    token: CancellationToken,
    reason: OnceLock<AbortReason>,
}

impl AbortGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token handed to the backend call; cancelled when any trigger fires
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Fire the guard. Returns `true` if this call won the race, `false`
    /// if the guard was already tripped.
    pub fn trip(&self, reason: AbortReason) -> bool {
        let won = self.reason.set(reason).is_ok();
        if won {
            self.token.cancel();
        }
        won
    }

    /// The recorded reason, if any trigger has fired
    pub fn reason(&self) -> Option<AbortReason> {
        self.reason.get().copied()
    }

    /// Convert the recorded reason into the matching error.
    ///
    /// An untripped guard classifies as an external abort: the backend
    /// cancelled for a reason of its own, which callers treat the same as a
    /// caller-initiated abort.
    pub fn classify(&self, timeout_ms: u64) -> ProviderError {
        match self.reason() {
            Some(AbortReason::Timeout) => ProviderError::Timeout { timeout_ms },
            Some(reason) => ProviderError::Aborted { reason },
            None => ProviderError::Aborted {
                reason: AbortReason::External,
            },
        }
    }

    /// Re-map a backend error in light of the guard's state. Abort-shaped
    /// errors take the guard's classification, which knows which trigger
    /// actually fired; everything else passes through untouched.
    pub fn reclassify(&self, error: ProviderError, timeout_ms: u64) -> ProviderError {
        if error.is_abort() && self.reason().is_some() {
            return self.classify(timeout_ms);
        }
        error
    }
}
