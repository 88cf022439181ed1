//! # Odyssey
//!
//! A conversational query backend: questions are answered against one of
//! two retrieval indexes (knowledge-graph or flat vector), generated
//! tokens stream back to the caller as they are produced, and completed
//! answers are cached by normalized question text with frequency-ranked
//! eviction.
//!
//! ## Features
//!
//! - Response cache bounded by a capacity limit, evicting the least
//!   frequently asked questions first
//! - Redis-backed persistent store with an in-memory store for embedded
//!   use and tests; the cache degrades to a pass-through when the store
//!   is unreachable
//! - Rolling chat history window feeding a contextualized query
//! - Engine routing across {graph, vector} x {plain, rewritten}
//! - Per-query producer task relaying tokens through a bounded channel,
//!   with worker failures resolved to a single terminal error token
//!
//! ## Cache example
//!
//! ```no_run
//! use std::sync::Arc;
//! use odyssey::cache::{MemoryStore, ResponseCache};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ResponseCache::new(Arc::new(MemoryStore::new()), 6);
//!
//!     cache.put("What is Odyssey?", "A retrieval chat backend.").await;
//!     if let Some(answer) = cache.get("what is odyssey?").await {
//!         println!("{}", answer);
//!     }
//!
//!     for (question, count) in cache.top(None).await {
//!         println!("{} asked {} times", question, count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Querying
//!
//! The boundary layer (websocket, HTTP, CLI) builds a [`ChatManager`]
//! from settings, a [`cache::CacheStore`], and an [`query::EngineSet`]
//! of pre-built engines, then drives the token stream:
//!
//! ```no_run
//! # use odyssey::ChatManager;
//! # async fn example(manager: ChatManager) {
//! use futures::StreamExt;
//!
//! let mut tokens = manager.query("What is in the documents?", None, Some("KG")).await;
//! while let Some(token) = tokens.next().await {
//!     println!("{:?}", token);
//! }
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod manager;
pub mod query;

// Re-export main types for convenience
pub use cache::{normalize_question, CacheStats, CacheStore, MemoryStore, RedisStore, ResponseCache};
pub use config::{ChatSettings, ChatSettingsBuilder, DEFAULT_CONTEXT_PREAMBLE};
pub use error::{ChatError, Result};
pub use history::{ChatHistory, ChatMessage, Role};
pub use manager::ChatManager;
pub use query::{
    EngineSet, QueryEngine, QueryRouter, QueryTransformation, ResponseStream, StoreChoice,
    StreamToken, StreamingPipeline, TokenStream, EMPTY_RESPONSE_APOLOGY,
    NO_RELEVANT_INFORMATION,
};
