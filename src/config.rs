//! Configuration for the query backend

use serde::{Deserialize, Serialize};

/// Default preamble prepended to the conversational context sent to an
/// engine. Deployments replace this with their own instructions.
pub const DEFAULT_CONTEXT_PREAMBLE: &str =
    "You are a helpful assistant. Answer using the indexed documents and the \
     conversation so far. If the documents do not cover the question, say so.";

/// Settings shared by the cache, history, and streaming pipeline
///
/// Passed by reference into each component's constructor; there is no
/// global mutable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Number of conversational exchanges retained; the history window
    /// holds `2 * chat_size` messages (one user and one assistant turn
    /// per exchange)
    pub chat_size: usize,

    /// Maximum number of cached answers retained after pruning
    pub max_cached_items: usize,

    /// Maximum number of queries streaming concurrently
    pub worker_pool_size: usize,

    /// Capacity of the per-query token hand-off channel
    pub stream_buffer: usize,

    /// Instructions prepended when building the contextualized query
    pub context_preamble: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            chat_size: 10,
            max_cached_items: 6,
            worker_pool_size: num_cpus::get(),
            stream_buffer: 32,
            context_preamble: DEFAULT_CONTEXT_PREAMBLE.to_string(),
        }
    }
}

impl ChatSettings {
    /// Create a new builder for chat settings
    pub fn builder() -> ChatSettingsBuilder {
        ChatSettingsBuilder::default()
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.chat_size == 0 {
            return Err("chat_size must be greater than 0".to_string());
        }

        if self.max_cached_items == 0 {
            return Err("max_cached_items must be greater than 0".to_string());
        }

        if self.worker_pool_size == 0 {
            return Err("worker_pool_size must be greater than 0".to_string());
        }

        if self.stream_buffer == 0 {
            return Err("stream_buffer must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Builder for chat settings
#[derive(Debug, Default)]
pub struct ChatSettingsBuilder {
    chat_size: Option<usize>,
    max_cached_items: Option<usize>,
    worker_pool_size: Option<usize>,
    stream_buffer: Option<usize>,
    context_preamble: Option<String>,
}

impl ChatSettingsBuilder {
    /// Set the number of retained conversational exchanges
    pub fn chat_size(mut self, size: usize) -> Self {
        self.chat_size = Some(size);
        self
    }

    /// Set the cache capacity bound
    pub fn max_cached_items(mut self, max: usize) -> Self {
        self.max_cached_items = Some(max);
        self
    }

    /// Set the number of concurrent streaming workers
    pub fn worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = Some(size);
        self
    }

    /// Set the token hand-off channel capacity
    pub fn stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = Some(capacity);
        self
    }

    /// Set the context preamble
    pub fn context_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.context_preamble = Some(preamble.into());
        self
    }

    /// Build the settings
    pub fn build(self) -> ChatSettings {
        let defaults = ChatSettings::default();

        ChatSettings {
            chat_size: self.chat_size.unwrap_or(defaults.chat_size),
            max_cached_items: self.max_cached_items.unwrap_or(defaults.max_cached_items),
            worker_pool_size: self.worker_pool_size.unwrap_or(defaults.worker_pool_size),
            stream_buffer: self.stream_buffer.unwrap_or(defaults.stream_buffer),
            context_preamble: self.context_preamble.unwrap_or(defaults.context_preamble),
        }
    }
}
