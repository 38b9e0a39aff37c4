//! Retrieval strategies: the index-guided pipeline and the full-document
//! judge fallback, both returning the same result shape with a
//! distinguishing method tag

pub mod indexed;
pub mod judge;
pub mod types;

pub use indexed::{IndexGuidedRetrieval, RetrievalParams};
pub use judge::JudgeRetrieval;
pub use types::{
    Chunk, ChunkMetadata, ContentSource, RetrievalMethod, RetrievalResult, RetrievalStatus,
};
