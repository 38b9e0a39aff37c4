//! Retrieval result types
//!
//! Transient values returned to the consuming assistant; never persisted.
//! An empty `chunks` list means "no grounding available" and the consumer
//! must refuse to answer rather than fabricate one — the `status` tag plus
//! the natural-language `message` carry that refusal.

use crate::index::PageRange;
use serde::{Deserialize, Serialize};

/// Which retrieval strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    /// Three-phase index-guided pipeline
    IndexGuided,

    /// Full-document LLM-as-judge evaluation
    JudgeLlm,
}

/// Machine-readable outcome tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    /// Grounded chunks were produced
    Ok,

    /// No document cleared the relevance filter
    NoRelevantDocuments,

    /// Documents matched but no section content could be loaded
    NoRelevantSections,

    /// Content was retrieved but the final synthesis call failed
    SynthesisFailed,
}

/// Where a chunk's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentSource {
    /// Page-addressed read of the indexed range
    Pages,

    /// Structural header match on the full text (page semantics absent)
    HeaderMatch,

    /// Section summary substituted because the header could not be found;
    /// the span is not primary text
    SummaryFallback,

    /// Whole document (judge path)
    FullDocument,
}

/// Chunk provenance metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Document identifier
    pub document_id: String,

    /// Document code
    pub code: String,

    /// Document category
    pub category: String,

    /// Section id within the document, when section-scoped
    pub section_id: Option<String>,

    /// Section title, when section-scoped
    pub section_title: Option<String>,

    /// Pages the chunk covers, when page-addressed
    pub page_range: Option<PageRange>,

    /// How the content was obtained
    pub content_source: ContentSource,
}

/// One retrieved piece of grounding content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Retrieved text
    pub content: String,

    /// Provenance
    pub metadata: ChunkMetadata,

    /// Relevance score in [0, 1]
    pub score: f32,

    /// Citation string, strategy-tagged
    pub citation: String,

    /// Model reasoning for including this chunk
    pub reasoning: Option<String>,
}

/// Result of one retrieval invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Synthesized answer, when the strategy produces one
    pub answer: Option<String>,

    /// Grounding chunks, ordered by relevance
    pub chunks: Vec<Chunk>,

    /// Strategy that produced this result
    pub method: RetrievalMethod,

    /// Machine-readable outcome
    pub status: RetrievalStatus,

    /// Natural-language note for degraded outcomes
    pub message: Option<String>,

    /// Wall-clock time of the invocation
    pub elapsed_ms: u64,
}

impl RetrievalResult {
    /// Empty result carrying an explicit refusal
    pub fn no_grounding(method: RetrievalMethod, status: RetrievalStatus, message: impl Into<String>) -> Self {
        Self {
            answer: None,
            chunks: Vec::new(),
            method,
            status,
            message: Some(message.into()),
            elapsed_ms: 0,
        }
    }

    /// Whether the consumer has grounding to answer from
    pub fn has_grounding(&self) -> bool {
        !self.chunks.is_empty()
    }
}
