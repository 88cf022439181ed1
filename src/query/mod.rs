//! Query routing and streaming
//!
//! [`QueryRouter`] picks one of four pre-built retrieval engines
//! ({graph, vector} x {plain, rewritten}); [`StreamingPipeline`] drives
//! a routed query end to end, relaying tokens to the caller as they are
//! produced and folding the completed answer back into chat history and
//! the response cache.

pub mod engine;
pub mod pipeline;
pub mod router;

pub use engine::{QueryEngine, QueryTransformation, StoreChoice, TokenStream};
pub use pipeline::{
    ResponseStream, StreamToken, StreamingPipeline, EMPTY_RESPONSE_APOLOGY,
};
pub use router::{EngineSet, QueryRouter, NO_RELEVANT_INFORMATION};
