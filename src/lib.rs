//! docscout - agentic retrieval and search orchestration
//!
//! # Architecture
//!
//! - **gateway**: single capability boundary for model generation, tool
//!   selection and embedding
//! - **index**: hierarchical document indexer producing compact
//!   LLM-summarized JSON indices
//! - **retrieval**: three-phase index-guided pipeline, with a concurrent
//!   full-document judge fallback
//! - **agent**: bounded plan/act/observe/decide loop over an immutable
//!   tool set, with loop detection and graceful degradation
//! - **tools**: structured-query, document filesystem and termination
//!   tools behind a closed dispatch table

pub mod agent;
pub mod cli;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod index;
pub mod retrieval;
pub mod source;
pub mod tools;

// Re-export commonly used types
pub use errors::{EngineError, Result};
