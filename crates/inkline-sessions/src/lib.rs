//! # Inkline Sessions
//!
//! Lifecycle management for expensive backend model sessions.
//!
//! The [`SessionManager`] owns a registry of live sessions keyed by
//! configuration and scope, reuses them while they stay warm, expires them
//! after five idle minutes, and isolates individual prompts by cloning the
//! base session whenever the backend supports it. Every prompt is bound to
//! an [`AbortGuard`] that classifies whichever of timeout, external
//! cancellation, or supersession fires first.

pub mod abort;
pub mod manager;
pub mod scope;

pub use abort::AbortGuard;
pub use manager::{SessionManager, SessionManagerConfig};
pub use scope::derive_session_scope;
