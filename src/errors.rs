//! Error types for the docscout engine
//!
//! A single crate-wide error enum with conversions from the transport and
//! serialization layers. Components that must degrade instead of fail
//! (summarization fallbacks, judge scoring, tool execution) handle their
//! errors locally and never surface this type to the caller.

use thiserror::Error;

/// Main error type for the retrieval and search engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Model gateway failures (unreachable host, protocol error)
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Structured output could not be recovered from model text
    #[error("Structured output parse error: {0}")]
    StructuredOutput(String),

    /// Document source errors (unsupported format, empty extraction)
    #[error("Document source error: {0}")]
    Source(String),

    /// Index build or persistence errors
    #[error("Index error: {0}")]
    Index(String),

    /// Reasoning loop state machine violations
    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Engine error: {0}")]
    Other(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Other(err.to_string())
    }
}
