//! # Inkline Cache
//!
//! Bounded, time-limited cache for ranked completion suggestions.
//!
//! The cache maps a request fingerprint to the suggestions previously
//! produced for it, so repeated triggers over unchanged text never reach the
//! model backend. Entries expire after a TTL and the map is capped by a
//! least-frequently-used eviction policy.
//!
//! The cache is purely passive: expiry happens lazily on access, there are no
//! background timers and no I/O. Timestamps come from [`tokio::time::Instant`]
//! so tests running under a paused runtime can advance virtual time instead of
//! sleeping.

pub mod cache;

pub use cache::{CacheConfig, CompletionCache};
