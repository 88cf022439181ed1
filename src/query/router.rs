//! Query routing across the engine table
//!
//! Four fully-initialized engines cover {graph, vector} x {plain,
//! rewritten}; routing is a pure table lookup, never string matching at
//! query time.

use std::sync::Arc;

use futures::stream;
use tracing::{debug, warn};

use super::engine::{QueryEngine, QueryTransformation, StoreChoice, TokenStream};
use crate::error::{ChatError, Result};

/// Token substituted when an engine returns no response object, so an
/// empty stream never reaches the caller silently
pub const NO_RELEVANT_INFORMATION: &str =
    "I apologize, but I couldn't find any relevant information in the documents.";

/// The four engine variants the router selects among
pub struct EngineSet {
    /// Knowledge-graph index, plain query
    pub graph: Arc<dyn QueryEngine>,
    /// Vector index, plain query
    pub vector: Arc<dyn QueryEngine>,
    /// Knowledge-graph index behind the query-rewriting transform
    pub graph_rewrite: Arc<dyn QueryEngine>,
    /// Vector index behind the query-rewriting transform
    pub vector_rewrite: Arc<dyn QueryEngine>,
}

/// Selects an engine and exposes its token stream
///
/// Engines are installed exactly once, before first use; routing before
/// that is a setup ordering bug and surfaces as
/// [`ChatError::EngineNotInitialized`].
pub struct QueryRouter {
    engines: Option<EngineSet>,
}

impl QueryRouter {
    /// Create a router with no engines installed yet
    pub fn new() -> Self {
        Self { engines: None }
    }

    /// Create a router with its engines already installed
    pub fn with_engines(engines: EngineSet) -> Self {
        Self {
            engines: Some(engines),
        }
    }

    /// Install the engine table
    pub fn initialize(&mut self, engines: EngineSet) {
        self.engines = Some(engines);
    }

    /// Whether the engine table has been installed
    pub fn is_initialized(&self) -> bool {
        self.engines.is_some()
    }

    /// Look up the engine serving the given transformation and store
    /// choice
    pub fn select(
        &self,
        transformation: QueryTransformation,
        store_choice: StoreChoice,
    ) -> Result<&Arc<dyn QueryEngine>> {
        let engines = self
            .engines
            .as_ref()
            .ok_or(ChatError::EngineNotInitialized)?;

        Ok(match (transformation, store_choice) {
            (QueryTransformation::Plain, StoreChoice::KnowledgeGraph) => &engines.graph,
            (QueryTransformation::Plain, StoreChoice::Vector) => &engines.vector,
            (QueryTransformation::Rewrite, StoreChoice::KnowledgeGraph) => {
                &engines.graph_rewrite
            }
            (QueryTransformation::Rewrite, StoreChoice::Vector) => &engines.vector_rewrite,
        })
    }

    /// Run the selected engine and return its token stream unmodified
    ///
    /// An engine that produces no immediate response yields a single
    /// synthetic token instead of an empty stream.
    pub async fn route(
        &self,
        context: &str,
        transformation: QueryTransformation,
        store_choice: StoreChoice,
    ) -> Result<TokenStream> {
        let engine = self.select(transformation, store_choice)?;
        debug!("Routing query to {} engine ({})", store_choice, transformation);

        match engine.stream_query(context).await? {
            Some(tokens) => Ok(tokens),
            None => {
                warn!("Received empty response from query engine");
                Ok(Box::pin(stream::once(async {
                    Ok(NO_RELEVANT_INFORMATION.to_string())
                })))
            }
        }
    }
}

impl Default for QueryRouter {
    fn default() -> Self {
        Self::new()
    }
}
