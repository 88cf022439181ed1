//! Cache store abstraction and in-memory implementation
//!
//! A store exposes two logical regions keyed by normalized question:
//! opaque answer values, and an ordered frequency counter structure used
//! for eviction ranking and the top-questions view.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

/// Backing store for the response cache
///
/// Implementations must be safe under concurrent access from multiple
/// queries. The value region and the frequency region are mutated by
/// separate calls; a crash between the two can leave them momentarily out
/// of agreement, which the cache tolerates and heals on the next prune.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Lightweight liveness probe; every cache operation short-circuits
    /// to a miss/no-op when this fails
    async fn ping(&self) -> Result<()>;

    /// Read a stored answer
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    /// Write an answer, overwriting any previous one
    async fn set_value(&self, key: &str, value: &str) -> Result<()>;

    /// Delete an answer; deleting a missing key is not an error
    async fn delete_value(&self, key: &str) -> Result<()>;

    /// Increment the key's frequency counter, creating it at zero first,
    /// and return the new count
    async fn bump_frequency(&self, key: &str) -> Result<i64>;

    /// All (key, count) pairs ordered by count descending
    ///
    /// Tie order is backend-specific but deterministic: the in-memory
    /// store ranks the most recently bumped key first, Redis uses its
    /// sorted-set member ordering.
    async fn frequencies_desc(&self) -> Result<Vec<(String, i64)>>;

    /// Remove one key's frequency counter
    async fn remove_frequency(&self, key: &str) -> Result<()>;

    /// Drop the entire frequency region
    async fn clear_frequencies(&self) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

struct FrequencyEntry {
    count: i64,
    last_bump: u64,
}

struct MemoryRegions {
    values: HashMap<String, String>,
    frequencies: HashMap<String, FrequencyEntry>,
    bump_seq: u64,
}

/// In-memory store for embedded use and tests
///
/// Both regions live under one lock, so individual operations are atomic
/// with respect to each other. A monotonic bump sequence makes frequency
/// ties order deterministically, most recently bumped first.
pub struct MemoryStore {
    regions: Mutex<MemoryRegions>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            regions: Mutex::new(MemoryRegions {
                values: HashMap::new(),
                frequencies: HashMap::new(),
                bump_seq: 0,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let regions = self.regions.lock().await;
        Ok(regions.values.get(key).cloned())
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let mut regions = self.regions.lock().await;
        regions.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<()> {
        let mut regions = self.regions.lock().await;
        regions.values.remove(key);
        Ok(())
    }

    async fn bump_frequency(&self, key: &str) -> Result<i64> {
        let mut regions = self.regions.lock().await;
        regions.bump_seq += 1;
        let seq = regions.bump_seq;
        let entry = regions
            .frequencies
            .entry(key.to_string())
            .or_insert(FrequencyEntry {
                count: 0,
                last_bump: seq,
            });
        entry.count += 1;
        entry.last_bump = seq;
        Ok(entry.count)
    }

    async fn frequencies_desc(&self) -> Result<Vec<(String, i64)>> {
        let regions = self.regions.lock().await;
        let mut ranked: Vec<(&String, &FrequencyEntry)> =
            regions.frequencies.iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.count.cmp(&a.count).then(b.last_bump.cmp(&a.last_bump))
        });
        Ok(ranked
            .into_iter()
            .map(|(key, entry)| (key.clone(), entry.count))
            .collect())
    }

    async fn remove_frequency(&self, key: &str) -> Result<()> {
        let mut regions = self.regions.lock().await;
        regions.frequencies.remove(key);
        Ok(())
    }

    async fn clear_frequencies(&self) -> Result<()> {
        let mut regions = self.regions.lock().await;
        regions.frequencies.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_value_region_roundtrip() {
        let store = MemoryStore::new();
        store.set_value("k", "v1").await.unwrap();
        store.set_value("k", "v2").await.unwrap();
        assert_eq!(store.get_value("k").await.unwrap(), Some("v2".to_string()));

        store.delete_value("k").await.unwrap();
        assert_eq!(store.get_value("k").await.unwrap(), None);

        // Deleting again is a no-op
        store.delete_value("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_bump_returns_new_count() {
        let store = MemoryStore::new();
        assert_eq!(store.bump_frequency("q").await.unwrap(), 1);
        assert_eq!(store.bump_frequency("q").await.unwrap(), 2);
        assert_eq!(store.bump_frequency("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_frequencies_ordered_desc() {
        let store = MemoryStore::new();
        store.bump_frequency("low").await.unwrap();
        store.bump_frequency("high").await.unwrap();
        store.bump_frequency("high").await.unwrap();
        store.bump_frequency("high").await.unwrap();

        let ranked = store.frequencies_desc().await.unwrap();
        assert_eq!(ranked[0], ("high".to_string(), 3));
        assert_eq!(ranked[1], ("low".to_string(), 1));
    }

    #[tokio::test]
    async fn test_ties_rank_most_recent_bump_first() {
        let store = MemoryStore::new();
        store.bump_frequency("first").await.unwrap();
        store.bump_frequency("second").await.unwrap();

        let ranked = store.frequencies_desc().await.unwrap();
        assert_eq!(ranked[0].0, "second");
        assert_eq!(ranked[1].0, "first");

        // Bumping "first" again moves it ahead on recency and count
        store.bump_frequency("first").await.unwrap();
        let ranked = store.frequencies_desc().await.unwrap();
        assert_eq!(ranked[0].0, "first");
    }

    #[tokio::test]
    async fn test_clear_frequencies() {
        let store = MemoryStore::new();
        store.bump_frequency("q").await.unwrap();
        store.clear_frequencies().await.unwrap();
        assert!(store.frequencies_desc().await.unwrap().is_empty());
    }
}
