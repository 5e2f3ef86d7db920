use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;

/// Default bound on the number of cached entries.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded key/value store where every entry remembers when it was written.
///
/// Staleness is decided by the reader: `get` takes the maximum age the caller
/// tolerates, so one store can hold data with different freshness needs.
/// Overflow evicts the least recently used entry.
pub struct TtlCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the value stored under `key`.
    ///
    /// With `max_age`, an entry older than `max_age` is evicted and reported
    /// as absent. An entry exactly `max_age` old is still returned.
    pub fn get(&self, key: &str, max_age: Option<Duration>) -> Option<V> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?.clone();

        if let Some(max_age) = max_age {
            if entry.inserted_at.elapsed() > max_age {
                entries.pop(key);
                return None;
            }
        }

        Some(entry.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };
        self.entries.lock().put(key.into(), entry);
    }

    pub fn delete(&self, key: &str) {
        self.entries.lock().pop(key);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
