//! Memoization of idempotent upstream reads.
//!
//! A [`Memo`] wraps one operation. Its [`CachePolicy`] decides how entries
//! leave the cache: least-recently-used eviction once `capacity` is reached,
//! optionally combined with a fixed time-to-live counted from insertion.
//! Only successful results are ever stored.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::CachePolicyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Bounded size, evicts the least recently used entry, never expires.
    Lru { capacity: usize },
    /// Entries expire `ttl` after insertion regardless of access; size is
    /// still bounded with LRU eviction.
    Ttl { capacity: usize, ttl: Duration },
}

impl CachePolicy {
    pub fn capacity(&self) -> usize {
        match *self {
            CachePolicy::Lru { capacity } | CachePolicy::Ttl { capacity, .. } => capacity,
        }
    }

    fn ttl(&self) -> Option<Duration> {
        match *self {
            CachePolicy::Lru { .. } => None,
            CachePolicy::Ttl { ttl, .. } => Some(ttl),
        }
    }
}

impl From<CachePolicyConfig> for CachePolicy {
    fn from(config: CachePolicyConfig) -> Self {
        match config.ttl {
            Some(ttl) => CachePolicy::Ttl {
                capacity: config.capacity,
                ttl,
            },
            None => CachePolicy::Lru {
                capacity: config.capacity,
            },
        }
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    last_used: u64,
}

struct Store<K, V> {
    entries: HashMap<K, Entry<V>>,
    tick: u64,
}

pub struct Memo<K, V> {
    name: &'static str,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
    store: Mutex<Store<K, V>>,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(name: &'static str, policy: CachePolicy) -> Self {
        Self::with_clock(name, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(name: &'static str, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            policy,
            clock,
            store: Mutex::new(Store {
                entries: HashMap::new(),
                tick: 0,
            }),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut store = self.lock();

        let expired = match store.entries.get(key) {
            Some(entry) => self.is_expired(entry, now),
            None => return None,
        };
        if expired {
            store.entries.remove(key);
            return None;
        }

        store.tick += 1;
        let tick = store.tick;
        let entry = store.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let capacity = self.policy.capacity();
        if capacity == 0 {
            return;
        }

        let now = self.clock.now();
        let mut store = self.lock();

        if !store.entries.contains_key(&key) && store.entries.len() >= capacity {
            if self.policy.ttl().is_some() {
                store.entries.retain(|_, entry| !self.is_expired(entry, now));
            }
            if store.entries.len() >= capacity {
                let oldest = store
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    log::debug!("{}: evicting {:?}", self.name, oldest);
                    store.entries.remove(&oldest);
                }
            }
        }

        store.tick += 1;
        let last_used = store.tick;
        store.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                last_used,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value for `key`, or run `fetch` and store its
    /// result if it succeeds. Errors pass through and are not stored.
    ///
    /// The lock is not held while `fetch` runs, so two callers missing on the
    /// same key may both fetch.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            log::debug!("{}: cache hit for {:?}", self.name, key);
            return Ok(value);
        }

        log::debug!("{}: cache miss for {:?}", self.name, key);
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        match self.policy.ttl() {
            Some(ttl) => now.saturating_duration_since(entry.inserted_at) >= ttl,
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store<K, V>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lru(capacity: usize) -> Memo<String, u32> {
        Memo::new("test", CachePolicy::Lru { capacity })
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let memo = lru(2);
        memo.insert("a".into(), 1);
        memo.insert("b".into(), 2);
        // Touch "a" so "b" becomes the eviction candidate.
        assert_eq!(memo.get(&"a".to_string()), Some(1));
        memo.insert("c".into(), 3);

        assert_eq!(memo.len(), 2);
        assert_eq!(memo.get(&"a".to_string()), Some(1));
        assert_eq!(memo.get(&"b".to_string()), None);
        assert_eq!(memo.get(&"c".to_string()), Some(3));
    }

    #[test]
    fn lru_never_expires() {
        let clock = Arc::new(ManualClock::new());
        let memo: Memo<String, u32> =
            Memo::with_clock("test", CachePolicy::Lru { capacity: 4 }, clock.clone());
        memo.insert("a".into(), 1);
        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert_eq!(memo.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn ttl_expires_regardless_of_access() {
        let clock = Arc::new(ManualClock::new());
        let ttl = Duration::from_secs(7200);
        let memo: Memo<String, u32> =
            Memo::with_clock("test", CachePolicy::Ttl { capacity: 4, ttl }, clock.clone());
        memo.insert("a".into(), 1);

        clock.advance(Duration::from_secs(7199));
        assert_eq!(memo.get(&"a".to_string()), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(memo.get(&"a".to_string()), None);
        assert!(memo.is_empty());
    }

    #[test]
    fn ttl_purges_expired_before_evicting_live_entries() {
        let clock = Arc::new(ManualClock::new());
        let ttl = Duration::from_secs(60);
        let memo: Memo<String, u32> =
            Memo::with_clock("test", CachePolicy::Ttl { capacity: 2, ttl }, clock.clone());
        memo.insert("old".into(), 1);
        clock.advance(Duration::from_secs(61));
        memo.insert("fresh".into(), 2);
        memo.insert("newer".into(), 3);

        assert_eq!(memo.get(&"fresh".to_string()), Some(2));
        assert_eq!(memo.get(&"newer".to_string()), Some(3));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let memo = lru(0);
        memo.insert("a".into(), 1);
        assert!(memo.is_empty());
    }

    #[tokio::test]
    async fn fetch_runs_once_per_key() {
        let memo = lru(10);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = memo
                .get_or_try_fetch("k".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let memo = lru(10);
        let calls = AtomicUsize::new(0);

        let first = memo
            .get_or_try_fetch("k".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>("boom".to_string())
            })
            .await;
        assert_eq!(first, Err("boom".to_string()));
        assert!(memo.is_empty());

        let second = memo
            .get_or_try_fetch("k".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(1)
            })
            .await;
        assert_eq!(second, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn policy_from_config() {
        let config = CachePolicyConfig {
            capacity: 5,
            ttl: Some(Duration::from_secs(10)),
        };
        assert_eq!(
            CachePolicy::from(config),
            CachePolicy::Ttl {
                capacity: 5,
                ttl: Duration::from_secs(10)
            }
        );
    }
}
