//! Retrieval engine seam
//!
//! The backend queries already-initialized retrieval engines through the
//! [`QueryEngine`] trait; index construction, embeddings, and model
//! selection all live behind it.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;

/// Ordered stream of generated text fragments
///
/// An `Err` item signals a failure while producing tokens; the stream is
/// not read past it.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A streaming retrieval engine
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Run a query against the engine's index and stream the generated
    /// answer
    ///
    /// Returns `Ok(None)` when the engine produced no immediate response
    /// object at all, as opposed to a response whose stream happens to
    /// yield nothing.
    async fn stream_query(&self, context: &str) -> Result<Option<TokenStream>>;
}

/// Which retrieval index serves the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreChoice {
    /// Knowledge-graph index
    KnowledgeGraph,
    /// Flat vector index
    #[default]
    Vector,
}

impl StoreChoice {
    /// Parse the boundary layer's store flag; anything other than the
    /// literal `"KG"` selects the vector index
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("KG") => StoreChoice::KnowledgeGraph,
            _ => StoreChoice::Vector,
        }
    }
}

impl fmt::Display for StoreChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreChoice::KnowledgeGraph => write!(f, "KG"),
            StoreChoice::Vector => write!(f, "vector"),
        }
    }
}

/// Optional query-rewriting step applied before retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryTransformation {
    /// Query passed through unmodified
    #[default]
    Plain,
    /// Hypothetical-answer expansion of the query
    Rewrite,
}

impl QueryTransformation {
    /// Parse the boundary layer's transformation flag; anything other
    /// than the literal `"rewrite"` selects the plain query
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("rewrite") => QueryTransformation::Rewrite,
            _ => QueryTransformation::Plain,
        }
    }
}

impl fmt::Display for QueryTransformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTransformation::Plain => write!(f, "plain"),
            QueryTransformation::Rewrite => write!(f, "rewrite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_choice_parsing() {
        assert_eq!(StoreChoice::from_flag(Some("KG")), StoreChoice::KnowledgeGraph);
        assert_eq!(StoreChoice::from_flag(Some("vector")), StoreChoice::Vector);
        assert_eq!(StoreChoice::from_flag(Some("SV")), StoreChoice::Vector);
        assert_eq!(StoreChoice::from_flag(None), StoreChoice::Vector);
    }

    #[test]
    fn test_transformation_parsing() {
        assert_eq!(
            QueryTransformation::from_flag(Some("rewrite")),
            QueryTransformation::Rewrite
        );
        assert_eq!(
            QueryTransformation::from_flag(Some("REWRITE")),
            QueryTransformation::Plain
        );
        assert_eq!(QueryTransformation::from_flag(None), QueryTransformation::Plain);
    }
}
