use crate::services::limiter::RateLimiter;
use crate::{MapError, Result};
use async_trait::async_trait;
use fxhash::FxHashMap;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// A downstream call wrapped by [`ThrottledCache`]
#[async_trait]
pub trait Producer: Send + Sync {
    type Query: Send + Sync + ?Sized;
    type Key: Eq + Hash + Clone + Debug + Send + Sync;
    type Value: Clone + Send + Sync;

    /// Normalized key; queries that map to the same key share one entry
    fn cache_key(&self, query: &Self::Query) -> Self::Key;

    /// Rejects malformed queries before they consume a rate-limit slot
    fn validate(&self, _query: &Self::Query) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self, query: &Self::Query) -> Result<Self::Value>;

    /// Degraded value returned when `fetch` fails. Never cached.
    fn fallback(&self, query: &Self::Query) -> Self::Value;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub insertion_seq: u64,
}

/// Insertion-ordered map with strict FIFO eviction.
///
/// Overwriting an existing key keeps its original position.
#[derive(Debug)]
pub struct FifoStore<K, V> {
    entries: FxHashMap<K, CacheEntry<V>>,
    order: VecDeque<(K, u64)>,
    next_seq: u64,
    max_entries: usize,
}

impl<K: Eq + Hash + Clone, V> FifoStore<K, V> {
    /// Capacity is at least one entry
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: FxHashMap::default(),
            order: VecDeque::with_capacity(max_entries),
            next_seq: 0,
            max_entries,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn entry(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts a value, returning the key evicted to make room, if any
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            return None;
        }

        let evicted = if self.entries.len() >= self.max_entries {
            self.evict_oldest()
        } else {
            None
        };

        let insertion_seq = self.next_seq;
        self.next_seq += 1;
        self.order.push_back((key.clone(), insertion_seq));
        self.entries.insert(
            key,
            CacheEntry {
                value,
                insertion_seq,
            },
        );
        evicted
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        // The order queue is cleaned lazily in evict_oldest
        self.entries.remove(key).map(|entry| entry.value)
    }

    fn evict_oldest(&mut self) -> Option<K> {
        while let Some((key, seq)) = self.order.pop_front() {
            let live = self
                .entries
                .get(&key)
                .is_some_and(|entry| entry.insertion_seq == seq);
            if live {
                self.entries.remove(&key);
                return Some(key);
            }
        }
        None
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}

/// Rate-limited, FIFO-bounded cache in front of a [`Producer`].
///
/// Hits never touch the limiter. Misses wait for a slot on the shared
/// limiter, check the store again (a concurrent call may have filled it),
/// then fetch. Failures resolve to the producer's fallback and are not
/// stored, so a later call can still succeed.
pub struct ThrottledCache<P: Producer> {
    producer: P,
    limiter: Arc<RateLimiter>,
    store: Mutex<FifoStore<P::Key, P::Value>>,
}

impl<P: Producer> ThrottledCache<P> {
    pub fn new(producer: P, limiter: Arc<RateLimiter>, max_entries: usize) -> Self {
        Self {
            producer,
            limiter,
            store: Mutex::new(FifoStore::new(max_entries)),
        }
    }

    /// Cached or fetched value, or the fallback on any failure
    pub async fn get(&self, query: &P::Query) -> P::Value {
        match self.try_get(query).await {
            Ok(value) => value,
            Err(MapError::Cancelled) => {
                log::debug!("{}: request cancelled, using fallback", self.limiter.name());
                self.producer.fallback(query)
            }
            Err(e) => {
                log::warn!("{}: {}, using fallback", self.limiter.name(), e);
                self.producer.fallback(query)
            }
        }
    }

    /// Like [`ThrottledCache::get`] but surfaces the error instead of the fallback
    pub async fn try_get(&self, query: &P::Query) -> Result<P::Value> {
        self.producer.validate(query)?;
        let key = self.producer.cache_key(query);
        if let Some(value) = self.cached(&key) {
            log::trace!("{}: hit {:?}", self.limiter.name(), key);
            return Ok(value);
        }

        self.limiter.acquire().await?;
        if let Some(value) = self.cached(&key) {
            return Ok(value);
        }

        let value = self.producer.fetch(query).await?;
        let evicted = self.lock_store().insert(key, value.clone());
        if let Some(evicted) = evicted {
            log::trace!("{}: evicted {:?}", self.limiter.name(), evicted);
        }
        Ok(value)
    }

    /// Looks up a key without fetching
    pub fn cached(&self, key: &P::Key) -> Option<P::Value> {
        self.lock_store().get(key).cloned()
    }

    pub fn contains(&self, query: &P::Query) -> bool {
        let key = self.producer.cache_key(query);
        self.lock_store().contains(&key)
    }

    pub fn len(&self) -> usize {
        self.lock_store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_store().is_empty()
    }

    pub fn clear(&self) {
        self.lock_store().clear();
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, FifoStore<P::Key, P::Value>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: Producer> std::fmt::Debug for ThrottledCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottledCache")
            .field("limiter", &self.limiter.name())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    #[test]
    fn test_fifo_evicts_first_inserted() {
        let mut store = FifoStore::new(3);
        store.insert("a", 1);
        store.insert("b", 2);
        store.insert("c", 3);

        assert_eq!(store.insert("d", 4), Some("a"));
        assert_eq!(store.len(), 3);
        assert!(!store.contains(&"a"));
        assert_eq!(store.get(&"b"), Some(&2));
        assert_eq!(store.get(&"c"), Some(&3));
        assert_eq!(store.get(&"d"), Some(&4));
    }

    #[test]
    fn test_fifo_ignores_reads() {
        let mut store = FifoStore::new(2);
        store.insert(1, "one");
        store.insert(2, "two");
        // Reading does not refresh position, unlike an LRU
        assert_eq!(store.get(&1), Some(&"one"));
        assert_eq!(store.insert(3, "three"), Some(1));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut store = FifoStore::new(2);
        store.insert(1, "one");
        store.insert(2, "two");
        assert_eq!(store.insert(1, "uno"), None);
        assert_eq!(store.get(&1), Some(&"uno"));
        assert_eq!(store.entry(&1).map(|e| e.insertion_seq), Some(0));
        assert_eq!(store.insert(3, "three"), Some(1));
    }

    #[test]
    fn test_removed_keys_are_skipped_on_eviction() {
        let mut store = FifoStore::new(2);
        store.insert(1, ());
        store.insert(2, ());
        store.remove(&1);
        store.insert(3, ());
        assert_eq!(store.len(), 2);
        assert_eq!(store.insert(4, ()), Some(2));
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut store = FifoStore::new(0);
        store.insert(1, ());
        assert_eq!(store.capacity(), 1);
        assert_eq!(store.insert(2, ()), Some(1));
    }

    /// Echo producer that records dispatch instants and can be told to fail
    struct Echo {
        calls: AtomicUsize,
        dispatched: Mutex<Vec<Instant>>,
        fail: bool,
    }

    impl Echo {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                dispatched: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl Producer for Echo {
        type Query = u32;
        type Key = u32;
        type Value = String;

        fn cache_key(&self, query: &u32) -> u32 {
            *query
        }

        async fn fetch(&self, query: &u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.dispatched.lock().unwrap().push(Instant::now());
            if self.fail {
                Err(MapError::ProviderUnavailable("down".to_string()))
            } else {
                Ok(format!("value-{query}"))
            }
        }

        fn fallback(&self, query: &u32) -> String {
            format!("fallback-{query}")
        }
    }

    fn limiter(ms: u64) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new("echo", Duration::from_millis(ms)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_skips_producer_and_limiter() {
        let cache = ThrottledCache::new(Echo::new(false), limiter(1000), 8);
        assert_eq!(cache.get(&1).await, "value-1");

        let start = Instant::now();
        assert_eq!(cache.get(&1).await, "value-1");
        assert_eq!(Instant::now(), start);
        assert_eq!(cache.producer().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_are_spaced() {
        let cache = ThrottledCache::new(Echo::new(false), limiter(1000), 8);
        cache.get(&1).await;
        cache.get(&2).await;

        let dispatched = cache.producer().dispatched.lock().unwrap().clone();
        assert_eq!(dispatched.len(), 2);
        assert!(dispatched[1] - dispatched[0] >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_returns_fallback_without_caching() {
        let cache = ThrottledCache::new(Echo::new(true), limiter(10), 8);
        assert_eq!(cache.get(&7).await, "fallback-7");
        assert!(cache.is_empty());

        assert!(matches!(
            cache.try_get(&7).await,
            Err(MapError::ProviderUnavailable(_))
        ));
        assert_eq!(cache.producer().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_through_cache() {
        let cache = ThrottledCache::new(Echo::new(false), limiter(1), 3);
        for key in 0..4 {
            cache.get(&key).await;
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&0));
        for key in 1..4 {
            assert_eq!(cache.cached(&key), Some(format!("value-{key}")));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_limiter_yields_fallback() {
        let cache = ThrottledCache::new(Echo::new(false), limiter(1000), 8);
        cache.get(&1).await;
        cache.limiter().close();

        assert_eq!(cache.get(&2).await, "fallback-2");
        // Hits still resolve after teardown
        assert_eq!(cache.get(&1).await, "value-1");
        assert_eq!(cache.producer().calls.load(Ordering::SeqCst), 1);
    }
}
