//! Chat manager
//!
//! Wires the cache, history, router, and pipeline together and exposes
//! the query surface plus the operational cache controls (top questions,
//! clear). Engines arrive pre-built; index construction happens
//! elsewhere.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::cache::{CacheStats, CacheStore, ResponseCache};
use crate::config::ChatSettings;
use crate::error::{ChatError, Result};
use crate::history::{ChatHistory, ChatMessage};
use crate::query::{
    EngineSet, QueryRouter, QueryTransformation, ResponseStream, StoreChoice,
    StreamingPipeline,
};

/// Coordinates the query system components
pub struct ChatManager {
    settings: ChatSettings,
    cache: Arc<ResponseCache>,
    history: Arc<Mutex<ChatHistory>>,
    pipeline: StreamingPipeline,
}

impl ChatManager {
    /// Build a manager from validated settings, a cache store, and the
    /// four retrieval engines
    pub fn new(
        settings: ChatSettings,
        store: Arc<dyn CacheStore>,
        engines: EngineSet,
    ) -> Result<Self> {
        settings.validate().map_err(ChatError::ConfigError)?;

        let cache = Arc::new(ResponseCache::new(store, settings.max_cached_items));
        let history = Arc::new(Mutex::new(ChatHistory::new(settings.chat_size)));
        let router = Arc::new(QueryRouter::with_engines(engines));
        let pipeline =
            StreamingPipeline::new(&settings, router, cache.clone(), history.clone());

        info!("Chat manager initialized");
        Ok(Self {
            settings,
            cache,
            history,
            pipeline,
        })
    }

    /// Answer a question, streaming tokens as they are produced
    ///
    /// `transformation` and `store_choice` are the boundary layer's raw
    /// flags: `"rewrite"` enables the query-rewriting transform and
    /// `"KG"` selects the knowledge-graph index, anything else falls
    /// back to the plain query against the vector index.
    pub async fn query(
        &self,
        question: &str,
        transformation: Option<&str>,
        store_choice: Option<&str>,
    ) -> ResponseStream {
        self.pipeline
            .query(
                question,
                QueryTransformation::from_flag(transformation),
                StoreChoice::from_flag(store_choice),
            )
            .await
    }

    /// The most frequently asked questions with their counts
    pub async fn top_questions(&self, count: Option<usize>) -> Vec<(String, i64)> {
        self.cache.top(count).await
    }

    /// Drop every cached answer
    pub async fn clear_cache(&self) -> bool {
        self.cache.clear().await
    }

    /// Snapshot of cache activity counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Snapshot of the chat history, oldest first
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.to_vec()
    }

    /// The settings this manager was built with
    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }
}
