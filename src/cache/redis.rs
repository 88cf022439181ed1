//! Redis-backed cache store
//!
//! Answers live as JSON-encoded strings under `<prefix><key>`; frequency
//! counters live in a single sorted set, so ranked reads are one
//! `ZREVRANGE` and eviction is a `DEL` plus a `ZREM` per key.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::store::CacheStore;
use crate::error::Result;

const DEFAULT_VALUE_PREFIX: &str = "odyssey:cache:";
const DEFAULT_FREQUENCY_KEY: &str = "odyssey:query_frequency";

/// Cache store backed by a Redis server
pub struct RedisStore {
    client: redis::Client,
    value_prefix: String,
    frequency_key: String,
}

impl RedisStore {
    /// Create a store against the given Redis URL with the default key
    /// namespace
    pub fn new(url: &str) -> Result<Self> {
        Self::with_namespace(url, DEFAULT_VALUE_PREFIX, DEFAULT_FREQUENCY_KEY)
    }

    /// Create a store with an explicit key namespace
    ///
    /// `value_prefix` is prepended to every answer key; `frequency_key`
    /// names the sorted set holding the counters.
    pub fn with_namespace(
        url: &str,
        value_prefix: impl Into<String>,
        frequency_key: impl Into<String>,
    ) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            value_prefix: value_prefix.into(),
            frequency_key: frequency_key.into(),
        })
    }

    fn value_key(&self, key: &str) -> String {
        format!("{}{}", self.value_prefix, key)
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let data: Option<String> = conn.get(self.value_key(key)).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(value)?;
        let _: () = conn.set(self.value_key(key), json).await?;
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(self.value_key(key)).await?;
        Ok(())
    }

    async fn bump_frequency(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection().await?;
        let count: f64 = conn.zincr(&self.frequency_key, key, 1i64).await?;
        Ok(count as i64)
    }

    async fn frequencies_desc(&self) -> Result<Vec<(String, i64)>> {
        let mut conn = self.connection().await?;
        let ranked: Vec<(String, f64)> = conn
            .zrevrange_withscores(&self.frequency_key, 0, -1)
            .await?;
        Ok(ranked
            .into_iter()
            .map(|(key, count)| (key, count as i64))
            .collect())
    }

    async fn remove_frequency(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.zrem(&self.frequency_key, key).await?;
        Ok(())
    }

    async fn clear_frequencies(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(&self.frequency_key).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_key_layout() {
        let store = RedisStore::new("redis://localhost:6379").unwrap();
        assert_eq!(
            store.value_key("what is odyssey?"),
            "odyssey:cache:what is odyssey?"
        );
    }

    #[test]
    fn test_custom_namespace() {
        let store = RedisStore::with_namespace(
            "redis://localhost:6379",
            "app:answers:",
            "app:frequency",
        )
        .unwrap();
        assert_eq!(store.value_key("q"), "app:answers:q");
        assert_eq!(store.frequency_key, "app:frequency");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RedisStore::new("not a url").is_err());
    }

    #[test]
    fn test_value_encoding_lossless() {
        // Values travel through JSON encoding; embedded newlines and
        // markup must survive the round trip exactly.
        let value = "line one\n<b>bold</b>\r\n  trailing  ";
        let json = serde_json::to_string(value).unwrap();
        let back: String = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
