//! # Inkline Completion
//!
//! Completion request lifecycle orchestration for inline text suggestions.
//!
//! The [`CompletionEngine`] turns a "user wants a suggestion now" event into
//! zero or more ranked insertion strings while keeping an expensive model
//! backend under control:
//!
//! 1. **Supersession** — starting a new request cancels any in-flight one;
//!    the superseded call resolves to an empty list, never an error.
//! 2. **Cache fast path** — a fingerprint of (domain, language, text, caret)
//!    short-circuits repeated triggers without touching the backend.
//! 3. **Admission** — backend calls run single-file through a rate-limited
//!    queue.
//! 4. **Sessions** — warm backend sessions are reused per configuration and
//!    page scope, with per-prompt clone isolation.
//! 5. **Reconciliation** — model output is parsed tolerantly, trimmed of any
//!    text already present around the caret, ranked, and cached.

pub mod config;
pub mod engine;
pub mod error;
pub mod overlap;
pub mod parser;
pub mod prompt;
pub mod ranker;
pub mod types;

pub use config::{CompletionOptions, EngineConfig};
pub use engine::CompletionEngine;
pub use error::CompletionError;
pub use overlap::{sanitize_suggestion_text, trim_suggestion_overlap, trim_suggestions};
pub use parser::{parse_structured, suggestion_constraint};
pub use prompt::{AssembledPrompt, InsertionPromptBuilder, PromptAssembler};
pub use ranker::SuggestionRanker;
pub use types::{CompletionRequest, CompletionSuggestion, ContextMetadata};

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, CompletionError>;
