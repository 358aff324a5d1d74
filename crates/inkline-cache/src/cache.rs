//! Fingerprint-keyed suggestion cache with TTL and LFU eviction

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry stays valid after being stored
    pub ttl: Duration,
    /// Hard cap on the number of entries
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300), // 5 minutes
            max_entries: 1000,
        }
    }
}

struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
    access_count: u64,
}

/// Fingerprint-keyed cache for ranked suggestion lists.
///
/// `get` returns a clone of the stored value, never a reference into the
/// map, so callers cannot mutate cached state. Expired entries are removed
/// lazily on access. When the cache is full, the entry with the smallest
/// access count is evicted before the next insert; ties go to whichever
/// entry is encountered first while scanning. This is a
/// least-frequently-used policy, not LRU.
pub struct CompletionCache<T> {
    config: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> CompletionCache<T> {
    /// Create a cache with the default TTL (5 minutes) and capacity (1000)
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with explicit configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a value under `key`, evicting the least-used entry if the cache
    /// is at capacity
    pub fn set(&self, key: &str, value: T) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.config.max_entries && !entries.contains_key(key) {
            Self::evict_least_used(&mut entries);
        }
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                access_count: 1,
            },
        );
    }

    /// Look up `key`, returning a copy of the stored value if present and
    /// not expired. A hit bumps the entry's access count; an expired entry
    /// is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(key)?;
        if entry.stored_at.elapsed() > self.config.ttl {
            entries.remove(key);
            return None;
        }
        entry.access_count += 1;
        Some(entry.value.clone())
    }

    /// Number of live entries (including any not yet lazily expired)
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn evict_least_used(entries: &mut HashMap<String, CacheEntry<T>>) {
        let victim = entries
            .iter()
            .min_by_key(|(_, entry)| entry.access_count)
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            debug!(%key, "evicting least-used cache entry");
            entries.remove(&key);
        }
    }
}

impl<T: Clone> Default for CompletionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
