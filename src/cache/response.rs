//! Response cache with frequency-bounded eviction
//!
//! Completed answers are cached by normalized question text. Every
//! read-hit and every write bumps the key's frequency counter, and
//! pruning keeps only the `max_cached_items` highest-counter keys, so
//! historically popular answers stay resident while storage stays
//! bounded. The cache is an optimization, never a correctness
//! dependency: when the backing store is unreachable every operation
//! degrades to a miss or a no-op instead of failing the query path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::key::normalize_question;
use super::store::CacheStore;

/// Snapshot of cache activity counters
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses
    pub misses: u64,

    /// Number of answers written
    pub stores: u64,

    /// Number of entries removed by pruning
    pub evictions: u64,
}

impl CacheStats {
    /// Cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    evictions: AtomicU64,
}

impl AtomicStats {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Question-to-answer cache over a [`CacheStore`]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    max_cached_items: usize,
    // Serializes put/prune/clear so concurrent queries never interleave a
    // partial write-then-prune sequence. Racing writers to the same key
    // resolve last-write-wins.
    writer: Mutex<()>,
    stats: AtomicStats,
}

impl ResponseCache {
    /// Create a cache retaining at most `max_cached_items` answers
    pub fn new(store: Arc<dyn CacheStore>, max_cached_items: usize) -> Self {
        info!(
            "Response cache initialized ({} backend, max {} items)",
            store.name(),
            max_cached_items
        );
        Self {
            store,
            max_cached_items,
            writer: Mutex::new(()),
            stats: AtomicStats::default(),
        }
    }

    /// Whether the backing store is reachable
    pub async fn is_available(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache store unreachable: {}", e);
                false
            }
        }
    }

    /// Retrieve the cached answer for a question, if present
    ///
    /// A hit bumps the key's frequency counter. Never raises: backing
    /// store failures are logged and reported as a miss.
    pub async fn get(&self, question: &str) -> Option<String> {
        if !self.is_available().await {
            return None;
        }

        let key = normalize_question(question);
        match self.store.get_value(&key).await {
            Ok(Some(value)) => {
                if let Err(e) = self.store.bump_frequency(&key).await {
                    warn!("Failed to bump frequency for {}: {}", key, e);
                }
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit: {}", key);
                Some(value)
            }
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                error!("Error retrieving from cache: {}", e);
                None
            }
        }
    }

    /// Cache an answer for a question
    ///
    /// Writes the value, bumps the frequency counter, then prunes back to
    /// the capacity bound. Returns whether the write succeeded; failure
    /// is non-fatal to the caller.
    pub async fn put(&self, question: &str, response: &str) -> bool {
        if !self.is_available().await {
            return false;
        }

        let key = normalize_question(question);
        let _guard = self.writer.lock().await;

        let result = async {
            self.store.set_value(&key, response).await?;
            self.store.bump_frequency(&key).await?;
            Ok::<(), crate::error::ChatError>(())
        }
        .await;

        match result {
            Ok(()) => {
                self.prune_locked().await;
                self.stats.stores.fetch_add(1, Ordering::Relaxed);
                debug!("Cached response for: {}", key);
                true
            }
            Err(e) => {
                error!("Error caching response: {}", e);
                false
            }
        }
    }

    /// Enforce the capacity bound
    ///
    /// Removes every key ranked past `max_cached_items` in the frequency
    /// ordering from both the value and counter regions, and drops
    /// counters whose value is missing (left behind by a crash between
    /// the two region writes). Idempotent.
    pub async fn prune(&self) {
        let _guard = self.writer.lock().await;
        self.prune_locked().await;
    }

    async fn prune_locked(&self) {
        let ranked = match self.store.frequencies_desc().await {
            Ok(ranked) => ranked,
            Err(e) => {
                error!("Error pruning cache: {}", e);
                return;
            }
        };

        for (rank, (key, _count)) in ranked.iter().enumerate() {
            if rank < self.max_cached_items {
                // Retained; heal a counter orphaned by a crash between
                // the value write and the counter bump.
                match self.store.get_value(key).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        debug!("Dropping orphaned counter: {}", key);
                        if let Err(e) = self.store.remove_frequency(key).await {
                            warn!("Failed to drop orphaned counter {}: {}", key, e);
                        }
                    }
                    Err(e) => warn!("Error checking cached value {}: {}", key, e),
                }
            } else {
                debug!("Evicting cached response: {}", key);
                if let Err(e) = self.store.delete_value(key).await {
                    warn!("Failed to evict value {}: {}", key, e);
                }
                if let Err(e) = self.store.remove_frequency(key).await {
                    warn!("Failed to evict counter {}: {}", key, e);
                }
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Remove every cached answer and the entire frequency structure
    ///
    /// Best-effort: a concurrent reader may observe the cache mid-clear,
    /// but never for longer than one key-removal step.
    pub async fn clear(&self) -> bool {
        if !self.is_available().await {
            return false;
        }

        let _guard = self.writer.lock().await;

        let result = async {
            let ranked = self.store.frequencies_desc().await?;
            for (key, _count) in &ranked {
                self.store.delete_value(key).await?;
            }
            self.store.clear_frequencies().await?;
            Ok::<(), crate::error::ChatError>(())
        }
        .await;

        match result {
            Ok(()) => {
                info!("Cache cleared");
                true
            }
            Err(e) => {
                error!("Error clearing cache: {}", e);
                false
            }
        }
    }

    /// The highest-frequency questions with their counts, descending
    ///
    /// Returns up to `count` entries (default: the capacity bound).
    /// Empty when the store is unavailable or the cache is empty.
    pub async fn top(&self, count: Option<usize>) -> Vec<(String, i64)> {
        if !self.is_available().await {
            return Vec::new();
        }

        let limit = count.unwrap_or(self.max_cached_items);
        match self.store.frequencies_desc().await {
            Ok(mut ranked) => {
                ranked.truncate(limit);
                ranked
            }
            Err(e) => {
                error!("Error reading top questions: {}", e);
                Vec::new()
            }
        }
    }

    /// Snapshot of the activity counters
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// The configured capacity bound
    pub fn max_cached_items(&self) -> usize {
        self.max_cached_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;

    fn cache_with_capacity(max: usize) -> (Arc<MemoryStore>, ResponseCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), max);
        (store, cache)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_store, cache) = cache_with_capacity(4);
        assert!(cache.put("What is Odyssey?", "A chat backend.").await);
        assert_eq!(
            cache.get("what is odyssey?").await,
            Some("A chat backend.".to_string())
        );

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.stores, 1);
    }

    #[tokio::test]
    async fn test_get_miss() {
        let (_store, cache) = cache_with_capacity(4);
        assert_eq!(cache.get("never asked").await, None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_hit_bumps_frequency() {
        let (store, cache) = cache_with_capacity(4);
        cache.put("q", "a").await;

        for _ in 0..3 {
            cache.get("q").await;
        }

        let ranked = store.frequencies_desc().await.unwrap();
        // One bump from the write plus three from the hits
        assert_eq!(ranked[0], ("q".to_string(), 4));
    }

    #[tokio::test]
    async fn test_prune_idempotent() {
        let (store, cache) = cache_with_capacity(2);
        cache.put("a", "1").await;
        cache.put("b", "2").await;
        cache.put("c", "3").await;

        let ranked = store.frequencies_desc().await.unwrap();
        cache.prune().await;
        cache.prune().await;
        assert_eq!(store.frequencies_desc().await.unwrap(), ranked);
    }

    #[tokio::test]
    async fn test_prune_heals_orphaned_counter() {
        let (store, cache) = cache_with_capacity(4);
        cache.put("kept", "answer").await;
        // Counter without a value, as left by a crash mid-put
        store.bump_frequency("orphan").await.unwrap();

        cache.prune().await;

        let keys: Vec<String> = store
            .frequencies_desc()
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["kept".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_empties_both_regions() {
        let (store, cache) = cache_with_capacity(4);
        cache.put("a", "1").await;
        cache.put("b", "2").await;

        assert!(cache.clear().await);
        assert!(store.frequencies_desc().await.unwrap().is_empty());
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn test_lossless_value() {
        let (_store, cache) = cache_with_capacity(4);
        let value = "first line\n<p>markup &amp; entities</p>\n\ttabbed";
        cache.put("q", value).await;
        assert_eq!(cache.get("q").await, Some(value.to_string()));
    }
}
