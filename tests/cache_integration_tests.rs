//! Integration tests for the response cache
//!
//! These tests verify the complete cache behavior including:
//! - Key normalization
//! - The capacity bound and frequency-ranked eviction
//! - Frequency counting on hits and writes
//! - Degraded behavior when the backing store is unreachable
//! - Clearing and the top-questions view

use std::sync::Arc;

use async_trait::async_trait;
use odyssey::cache::{CacheStore, MemoryStore, ResponseCache};
use odyssey::error::{ChatError, Result};

/// Store whose every operation fails, simulating an unreachable backend
struct UnreachableStore;

#[async_trait]
impl CacheStore for UnreachableStore {
    async fn ping(&self) -> Result<()> {
        Err(ChatError::CacheUnavailable("connection refused".to_string()))
    }

    async fn get_value(&self, _key: &str) -> Result<Option<String>> {
        Err(ChatError::CacheUnavailable("connection refused".to_string()))
    }

    async fn set_value(&self, _key: &str, _value: &str) -> Result<()> {
        Err(ChatError::CacheUnavailable("connection refused".to_string()))
    }

    async fn delete_value(&self, _key: &str) -> Result<()> {
        Err(ChatError::CacheUnavailable("connection refused".to_string()))
    }

    async fn bump_frequency(&self, _key: &str) -> Result<i64> {
        Err(ChatError::CacheUnavailable("connection refused".to_string()))
    }

    async fn frequencies_desc(&self) -> Result<Vec<(String, i64)>> {
        Err(ChatError::CacheUnavailable("connection refused".to_string()))
    }

    async fn remove_frequency(&self, _key: &str) -> Result<()> {
        Err(ChatError::CacheUnavailable("connection refused".to_string()))
    }

    async fn clear_frequencies(&self) -> Result<()> {
        Err(ChatError::CacheUnavailable("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "unreachable"
    }
}

#[tokio::test]
async fn test_normalized_keys_collide() {
    let cache = ResponseCache::new(Arc::new(MemoryStore::new()), 4);

    assert!(cache.put("  Hello World  ", "greeting").await);
    assert_eq!(cache.get("hello world").await, Some("greeting".to_string()));
    assert_eq!(cache.get("HELLO WORLD").await, Some("greeting".to_string()));

    // One entry, not three
    assert_eq!(cache.top(None).await.len(), 1);
}

#[tokio::test]
async fn test_capacity_bound_holds_after_every_put() {
    let store = Arc::new(MemoryStore::new());
    let cache = ResponseCache::new(store.clone(), 3);

    for i in 0..6 {
        assert!(cache.put(&format!("q{}", i), &format!("answer {}", i)).await);
        assert!(store.frequencies_desc().await.unwrap().len() <= 3);
    }

    // All counters tie at one, so the most recently written keys remain
    let retained: Vec<String> = store
        .frequencies_desc()
        .await
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(retained, vec!["q5", "q4", "q3"]);

    assert_eq!(cache.get("q0").await, None);
    assert_eq!(cache.get("q5").await, Some("answer 5".to_string()));
}

#[tokio::test]
async fn test_lowest_frequency_evicted_first() {
    let cache = ResponseCache::new(Arc::new(MemoryStore::new()), 2);

    cache.put("a", "1").await;
    cache.put("b", "2").await;
    cache.get("a").await;
    cache.get("a").await;
    cache.put("c", "3").await;

    // "a" has the highest count, "b" the lowest; "c" is newest
    assert_eq!(cache.get("b").await, None);
    assert_eq!(cache.get("a").await, Some("1".to_string()));
    assert_eq!(cache.get("c").await, Some("3".to_string()));
}

#[tokio::test]
async fn test_hits_increment_frequency_by_count() {
    let cache = ResponseCache::new(Arc::new(MemoryStore::new()), 4);
    cache.put("popular", "answer").await;

    let before = cache.top(None).await[0].1;
    for _ in 0..5 {
        cache.get("popular").await;
    }
    let after = cache.top(None).await[0].1;

    assert_eq!(after, before + 5);
}

#[tokio::test]
async fn test_top_orders_descending_and_truncates() {
    let cache = ResponseCache::new(Arc::new(MemoryStore::new()), 5);

    cache.put("rare", "r").await;
    cache.put("common", "c").await;
    for _ in 0..3 {
        cache.get("common").await;
    }
    cache.put("middling", "m").await;
    cache.get("middling").await;

    let top = cache.top(None).await;
    assert_eq!(top[0].0, "common");
    assert_eq!(top[0].1, 4);
    assert_eq!(top[1].0, "middling");
    assert_eq!(top[2].0, "rare");

    let top_one = cache.top(Some(1)).await;
    assert_eq!(top_one.len(), 1);
    assert_eq!(top_one[0].0, "common");
}

#[tokio::test]
async fn test_unreachable_store_degrades_without_errors() {
    let cache = ResponseCache::new(Arc::new(UnreachableStore), 4);

    assert!(!cache.is_available().await);
    assert_eq!(cache.get("anything").await, None);
    assert!(!cache.put("anything", "value").await);
    assert!(cache.top(None).await.is_empty());
    assert!(!cache.clear().await);
}

#[tokio::test]
async fn test_clear_then_reuse() {
    let cache = ResponseCache::new(Arc::new(MemoryStore::new()), 4);

    cache.put("a", "1").await;
    cache.put("b", "2").await;
    assert!(cache.clear().await);

    assert_eq!(cache.get("a").await, None);
    assert!(cache.top(None).await.is_empty());

    // The cache keeps working after a clear
    cache.put("c", "3").await;
    assert_eq!(cache.get("c").await, Some("3".to_string()));
}

#[tokio::test]
async fn test_recache_overwrites_value_and_keeps_counting() {
    let cache = ResponseCache::new(Arc::new(MemoryStore::new()), 4);

    cache.put("q", "first answer").await;
    cache.put("q", "second answer").await;

    assert_eq!(cache.get("q").await, Some("second answer".to_string()));
    // Two writes plus one hit
    assert_eq!(cache.top(None).await[0].1, 3);
}
