use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;

use super::store::TtlCache;
use crate::errors::{AppError, AppResult};

/// Result of a remote fetch handed to [`SingleFlight`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<V> {
    value: Option<V>,
    cacheable: bool,
}

impl<V> Fetched<V> {
    /// A value that should be stored in the cache.
    pub fn cached(value: V) -> Self {
        Self {
            value: Some(value),
            cacheable: true,
        }
    }

    /// A value returned to every waiter but never stored.
    pub fn uncached(value: V) -> Self {
        Self {
            value: Some(value),
            cacheable: false,
        }
    }

    /// Nothing was found. Absence is never cached.
    pub fn absent() -> Self {
        Self {
            value: None,
            cacheable: false,
        }
    }
}

type Waiter<V> = oneshot::Sender<AppResult<Option<V>>>;

struct Shared<V> {
    cache: TtlCache<V>,
    in_flight: Mutex<HashMap<String, Vec<Waiter<V>>>>,
}

/// TTL cache with in-flight request coalescing.
///
/// On a miss exactly one fetch runs per composite key (cache key plus the
/// serialized extra parameters). The fetch runs on its own task, so it
/// finishes even if the caller that started it goes away. Every caller for the
/// key, the first one included, is parked as a waiter and receives the same
/// outcome once it completes. Failures reach every waiter and are never
/// cached.
pub struct SingleFlight<V> {
    shared: Arc<Shared<V>>,
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + 'static,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                cache: TtlCache::new(capacity),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn get(&self, key: &str, max_age: Option<Duration>) -> Option<V> {
        self.shared.cache.get(key, max_age)
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.shared.cache.set(key, value);
    }

    pub fn delete(&self, key: &str) {
        self.shared.cache.delete(key);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.shared.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.cache.is_empty()
    }

    /// Number of remote fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.lock().len()
    }

    /// Returns the cached value for `key` if it is younger than `max_age`,
    /// otherwise runs (or joins) the fetch for `key` + `extra`.
    ///
    /// Cache hits yield to the scheduler once before returning so hits and
    /// misses both complete asynchronously.
    pub async fn fetch_or_cached<P, F, Fut>(
        &self,
        key: &str,
        extra: &P,
        max_age: Option<Duration>,
        fetch: F,
    ) -> AppResult<Option<V>>
    where
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<Fetched<V>>> + Send + 'static,
    {
        if let Some(value) = self.shared.cache.get(key, max_age) {
            tokio::task::yield_now().await;
            return Ok(Some(value));
        }

        self.fetch(key, extra, fetch).await
    }

    /// Runs (or joins) the fetch for `key` + `extra` without consulting the
    /// cache first. A cacheable result still replaces the cached entry.
    pub async fn fetch<P, F, Fut>(&self, key: &str, extra: &P, fetch: F) -> AppResult<Option<V>>
    where
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<Fetched<V>>> + Send + 'static,
    {
        let slot = flight_key(key, extra)?;
        let (tx, rx) = oneshot::channel();

        let starts_fetch = {
            let mut in_flight = self.shared.in_flight.lock();
            match in_flight.get_mut(&slot) {
                Some(waiters) => {
                    waiters.push(tx);
                    false
                }
                None => {
                    in_flight.insert(slot.clone(), vec![tx]);
                    true
                }
            }
        };

        if starts_fetch {
            let guard = FlightGuard {
                shared: Arc::clone(&self.shared),
                slot: Some(slot),
            };
            let key = key.to_string();

            tokio::spawn(async move {
                let outcome = fetch().await.map(|fetched| {
                    if fetched.cacheable {
                        if let Some(value) = &fetched.value {
                            guard.shared.cache.set(key.as_str(), value.clone());
                        }
                    }
                    fetched.value
                });

                let waiters = guard.release();
                tracing::trace!(key = %key, waiters = waiters.len(), "releasing lookup result");
                for waiter in waiters {
                    let _ = waiter.send(outcome.clone());
                }
            });
        } else {
            tracing::trace!(key = %key, "joining in-flight lookup");
        }

        rx.await
            .map_err(|_| AppError::internal(format!("lookup for {key} ended without a result")))?
    }
}

fn flight_key<P: Serialize + ?Sized>(key: &str, extra: &P) -> AppResult<String> {
    let extra = serde_json::to_string(extra)
        .map_err(|err| AppError::internal(format!("failed to serialize lookup parameters: {err}")))?;
    Ok(format!("{key}!!!{extra}"))
}

/// Owns an in-flight slot for the lifetime of its fetch task. If the task
/// dies before `release` (a panic in the fetch), dropping the guard clears the
/// slot and closes every waiter's channel.
struct FlightGuard<V> {
    shared: Arc<Shared<V>>,
    slot: Option<String>,
}

impl<V> FlightGuard<V> {
    fn release(mut self) -> Vec<Waiter<V>> {
        self.slot
            .take()
            .and_then(|slot| self.shared.in_flight.lock().remove(&slot))
            .unwrap_or_default()
    }
}

impl<V> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.shared.in_flight.lock().remove(&slot);
        }
    }
}
