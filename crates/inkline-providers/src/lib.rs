//! # Inkline Providers
//!
//! Unified abstraction over completion model backends for Inkline.
//!
//! A backend is anything that can create stateful model sessions and answer
//! prompts through them: a local inference daemon, a remote chat-completions
//! API, or an in-process stub for tests. The crate also owns the admission
//! queue that serializes backend calls, since model sessions are not safely
//! shared across overlapping prompts.

pub mod admission;
pub mod backend;
pub mod error;
pub mod models;
pub mod providers;

pub use admission::AdmissionQueue;
pub use backend::{ModelBackend, ModelSession};
pub use error::{AbortReason, ProviderError};
pub use models::{AiConfig, Availability, OutputLanguage, PromptOptions};
pub use providers::{LocalProvider, RemoteProvider, StubBackend};

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, ProviderError>;
