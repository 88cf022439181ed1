//! Error types for the query backend
//!
//! This module defines the custom error type shared across the cache,
//! router, and streaming pipeline, along with a crate-wide `Result` alias.

use thiserror::Error;

/// Main error type for query and cache operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// Cache backing store unreachable; callers degrade to a miss/no-op
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Query engines used before they were installed
    #[error("Query engines not initialized. Call initialize() first")]
    EngineNotInitialized,

    /// Failure raised by a retrieval engine while producing tokens
    #[error("Engine error: {0}")]
    EngineError(String),

    /// Cache store operation failure
    #[error("Store error: {0}")]
    StoreError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Redis driver error (wrapper)
    #[error("Redis driver error: {0}")]
    DriverError(#[from] redis::RedisError),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for query and cache operations
pub type Result<T> = std::result::Result<T, ChatError>;

impl From<String> for ChatError {
    fn from(s: String) -> Self {
        ChatError::Other(s)
    }
}

impl From<&str> for ChatError {
    fn from(s: &str) -> Self {
        ChatError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ChatError::CacheUnavailable("connection refused".to_string());
        assert_eq!(error.to_string(), "Cache unavailable: connection refused");

        let error = ChatError::EngineNotInitialized;
        assert!(error.to_string().contains("not initialized"));

        let error = ChatError::EngineError("upstream timeout".to_string());
        assert_eq!(error.to_string(), "Engine error: upstream timeout");
    }

    #[test]
    fn test_error_conversion() {
        let error: ChatError = "test error".into();
        assert!(matches!(error, ChatError::Other(_)));

        let error: ChatError = "test error".to_string().into();
        assert!(matches!(error, ChatError::Other(_)));
    }
}
