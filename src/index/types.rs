//! Document index types
//!
//! The persisted index schema. One JSON file per document; the schema is
//! stable across versions and readers ignore unknown fields (serde's
//! default), so older engines can read newer files.

use crate::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Inclusive page range of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    /// First page, 1-indexed
    pub start: u32,

    /// Last page, inclusive
    pub end: u32,
}

impl PageRange {
    /// Create a new range
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of pages covered
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }

    /// A range is never empty; kept for API symmetry
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Display label, e.g. `3-7`
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// One section of an indexed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Identifier, unique within the document
    pub section_id: String,

    /// Section title
    pub title: String,

    /// Pages this section covers
    pub page_range: PageRange,

    /// LLM-generated summary of the section
    pub summary: String,

    /// Frequency-derived keywords (local approximation, no LLM call)
    pub keywords: Vec<String>,
}

/// Document-level metadata carried inside the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Document code
    pub code: String,

    /// Document version
    pub version: String,

    /// Document date
    pub date: String,

    /// When the index was built (RFC 3339)
    pub indexed_at: String,
}

/// Persisted index of one source document
///
/// Created by the indexer, immutable once written (re-indexing overwrites in
/// place), read by the retrieval engine and never mutated by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIndex {
    /// Stable document identifier
    pub document_id: String,

    /// Document title
    pub title: String,

    /// Category (parent directory, or "general")
    pub category: String,

    /// Source file name
    pub source_file: String,

    /// Total pages in the source
    pub total_pages: u32,

    /// LLM-generated global summary
    pub summary: String,

    /// Document metadata
    pub metadata: IndexMetadata,

    /// Ordered sections
    pub sections: Vec<Section>,
}

impl DocumentIndex {
    /// Look up a section by id
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    /// Verify the coverage invariant: section ranges are monotonically
    /// increasing, non-overlapping, and together cover `1..=total_pages`
    /// with no gaps.
    pub fn validate_coverage(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(EngineError::Index(format!(
                "index {} has no sections",
                self.document_id
            )));
        }

        let mut expected_start = 1u32;
        let mut seen_ids = std::collections::HashSet::new();

        for section in &self.sections {
            if !seen_ids.insert(section.section_id.as_str()) {
                return Err(EngineError::Index(format!(
                    "duplicate section id {} in {}",
                    section.section_id, self.document_id
                )));
            }

            if section.page_range.start != expected_start {
                return Err(EngineError::Index(format!(
                    "section {} of {} starts at page {}, expected {}",
                    section.section_id, self.document_id, section.page_range.start, expected_start
                )));
            }

            if section.page_range.end < section.page_range.start {
                return Err(EngineError::Index(format!(
                    "section {} of {} has inverted range {}",
                    section.section_id,
                    self.document_id,
                    section.page_range.label()
                )));
            }

            expected_start = section.page_range.end + 1;
        }

        if expected_start != self.total_pages + 1 {
            return Err(EngineError::Index(format!(
                "sections of {} cover pages 1-{} but the document has {} pages",
                self.document_id,
                expected_start - 1,
                self.total_pages
            )));
        }

        Ok(())
    }
}
