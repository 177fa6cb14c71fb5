//! LRU cache for validated search signals.
//!
//! Keys are `query + "|" + context`; values are the serialized signals. A
//! value is decoded (and therefore re-validated) on every hit, so a corrupt
//! entry behaves like a miss.
//!
//! Two in-flight queries for the same key may both miss and both insert; the
//! last write wins. The cache is an optimization, never a source of truth.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use crate::config::CacheConfig;
use crate::search::signals::SearchSignals;

/// Default number of cached signal sets.
pub const DEFAULT_SIGNAL_CACHE_SIZE: usize = 256;

/// Cache statistics for monitoring and tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    /// Hits whose stored value no longer decoded
    pub decode_failures: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe, bounded signal cache.
pub struct SignalCache {
    entries: Mutex<LruCache<String, String>>,
    stats: Mutex<CacheStats>,
    enabled: bool,
}

impl Default for SignalCache {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNAL_CACHE_SIZE)
    }
}

impl SignalCache {
    /// Create a cache holding at most `capacity` signal sets (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            stats: Mutex::new(CacheStats::default()),
            enabled: true,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(1)
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.capacity)
        } else {
            Self::disabled()
        }
    }

    /// Cache key for a query and optional context.
    pub fn key(query: &str, context: Option<&str>) -> String {
        format!("{query}|{}", context.unwrap_or(""))
    }

    /// Look up and decode signals for `key`.
    pub fn get(&self, key: &str) -> Option<SearchSignals> {
        if !self.enabled {
            return None;
        }
        let raw = self.entries.lock().get(key).cloned();
        let mut stats = self.stats.lock();
        let Some(raw) = raw else {
            stats.misses += 1;
            return None;
        };
        if let Ok(signals) = serde_json::from_str::<SearchSignals>(&raw) {
            stats.hits += 1;
            Some(signals)
        } else {
            stats.decode_failures += 1;
            stats.misses += 1;
            drop(stats);
            self.entries.lock().pop(key);
            None
        }
    }

    /// Serialize and store validated signals.
    pub fn put(&self, key: &str, signals: &SearchSignals) {
        if !self.enabled {
            return;
        }
        if let Some(raw) = encode(key, signals) {
            self.put_raw(key, raw);
        }
    }

    /// Store an already-serialized value.
    pub fn put_raw(&self, key: &str, raw: String) {
        if !self.enabled {
            return;
        }
        self.entries.lock().put(key.to_string(), raw);
        self.stats.lock().inserts += 1;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }

    /// Drop every entry and reset statistics.
    pub fn clear(&self) {
        self.entries.lock().clear();
        *self.stats.lock() = CacheStats::default();
    }
}

impl std::fmt::Debug for SignalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Serialize a cache value, logging and skipping the write on failure.
fn encode<T: Serialize>(key: &str, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(raw) => Some(raw),
        Err(err) => {
            warn!(key, error = %err, "dropping signal cache write");
            None
        }
    }
}
