//! Hierarchical document indexer
//!
//! Turns a long source document into a compact JSON index: pages are
//! partitioned into fixed-size batches, each batch is summarized through the
//! gateway, and one further gateway call condenses the batch summaries into
//! a global summary. Keywords are derived locally (no model call).
//!
//! A gateway failure never aborts an indexing job: batch summaries degrade
//! to truncated source text and the global summary degrades to the first
//! batch summary.

use crate::errors::Result;
use crate::gateway::{GenerateOptions, ModelGateway};
use crate::index::keywords::{extract_keywords, MAX_KEYWORDS};
use crate::index::store::IndexStore;
use crate::index::types::{DocumentIndex, IndexMetadata, PageRange, Section};
use crate::source::{self, meta, Page};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

/// Words kept in the truncated-text fallback summary
const FALLBACK_SUMMARY_WORDS: usize = 200;

/// Indexer options
#[derive(Debug, Clone)]
pub struct IndexerOptions {
    /// Pages per summarization batch
    pub batch_size: usize,

    /// Overwrite an existing index instead of returning it
    pub reindex: bool,

    /// Enable progress logging
    pub verbose: bool,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            reindex: false,
            verbose: false,
        }
    }
}

/// Builds document indices through the model gateway
pub struct DocumentIndexer {
    gateway: Arc<dyn ModelGateway>,
    store: IndexStore,
    options: IndexerOptions,
}

impl DocumentIndexer {
    /// Create an indexer with default options
    pub fn new(gateway: Arc<dyn ModelGateway>, store: IndexStore) -> Self {
        Self {
            gateway,
            store,
            options: IndexerOptions::default(),
        }
    }

    /// Override options
    pub fn with_options(mut self, options: IndexerOptions) -> Self {
        self.options = options;
        self
    }

    /// Index store in use
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Index one source document and persist the result.
    ///
    /// With `reindex` off, an existing index is returned untouched; with it
    /// on, the index file is fully overwritten.
    pub async fn index_document(
        &self,
        source_path: &Path,
        base_dir: Option<&Path>,
    ) -> Result<DocumentIndex> {
        let source = source::open_source(source_path)?;
        let pages = source.read_pages()?;

        let first_pages = pages
            .iter()
            .take(3)
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let meta = meta::extract(&first_pages, source_path, base_dir);
        let document_id = meta.code.clone();

        if !self.options.reindex && self.store.exists(&document_id) {
            if self.options.verbose {
                eprintln!("[INDEX] {} already indexed, skipping", document_id);
            }
            return self.store.load(&document_id);
        }

        if self.options.verbose {
            eprintln!(
                "[INDEX] {} ({} pages, batch size {})",
                document_id,
                pages.len(),
                self.options.batch_size
            );
        }

        // Batch summaries are issued sequentially to bound concurrent
        // gateway load during indexing; batches themselves are independent.
        let batches: Vec<&[Page]> = pages.chunks(self.options.batch_size.max(1)).collect();
        let mut sections = Vec::with_capacity(batches.len());

        for (i, batch) in batches.iter().enumerate() {
            let summary = self.summarize_batch(batch).await;
            let keywords = extract_keywords(&summary, MAX_KEYWORDS);

            sections.push(Section {
                section_id: (i + 1).to_string(),
                title: format!("Section {}", i + 1),
                page_range: PageRange::new(batch[0].number, batch[batch.len() - 1].number),
                summary,
                keywords,
            });

            if self.options.verbose {
                eprintln!("[INDEX]   batch {}/{} summarized", i + 1, batches.len());
            }
        }

        let global_summary = self.summarize_document(&sections).await;

        let index = DocumentIndex {
            document_id,
            title: meta.title,
            category: meta.category,
            source_file: meta.source_file,
            total_pages: pages.len() as u32,
            summary: global_summary,
            metadata: IndexMetadata {
                code: meta.code,
                version: meta.version,
                date: meta.date,
                indexed_at: Utc::now().to_rfc3339(),
            },
            sections,
        };

        index.validate_coverage()?;
        let path = self.store.save(&index)?;

        if self.options.verbose {
            eprintln!("[INDEX] saved {}", path.display());
        }

        Ok(index)
    }

    /// Index every supported document under a directory tree.
    ///
    /// Per-document failures are skipped so one unreadable file cannot stop
    /// a corpus run.
    pub async fn index_directory(&self, dir: &Path) -> Result<Vec<DocumentIndex>> {
        let mut indices = Vec::new();

        for path in source::discover_documents(dir)? {
            match self.index_document(&path, Some(dir)).await {
                Ok(index) => indices.push(index),
                Err(e) => {
                    if self.options.verbose {
                        eprintln!("[INDEX] skipping {}: {}", path.display(), e);
                    }
                }
            }
        }

        Ok(indices)
    }

    /// Summarize one page batch, degrading to truncated text on failure
    async fn summarize_batch(&self, batch: &[Page]) -> String {
        let pages_text = batch
            .iter()
            .map(|p| format!("=== Page {} ===\n{}", p.number, p.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Summarize the following pages of a procedural document.\n\n\
             INSTRUCTIONS:\n\
             - Identify the MAIN TOPIC of these pages\n\
             - List the KEY POINTS (at most 4)\n\
             - Mention REQUIREMENTS if present\n\
             - Mention DEADLINES if present\n\
             - At most 150 words\n\
             - Be specific and concrete\n\n\
             PAGES:\n{}\n\nSUMMARY:",
            pages_text
        );

        match self
            .gateway
            .generate(&prompt, &GenerateOptions::new(0.3, 1024))
            .await
        {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                if self.options.verbose {
                    eprintln!("[INDEX] batch summary failed ({}), using truncated text", e);
                }
                truncate_words(&pages_text, FALLBACK_SUMMARY_WORDS)
            }
        }
    }

    /// Summarize the whole document from its batch summaries, degrading to
    /// the first batch summary on failure
    async fn summarize_document(&self, sections: &[Section]) -> String {
        let sections_text = sections
            .iter()
            .map(|s| {
                format!(
                    "Section {} (pages {}):\n{}",
                    s.section_id,
                    s.page_range.label(),
                    s.summary
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Summarize this complete procedural document.\n\n\
             INSTRUCTIONS:\n\
             - Identify the main OBJECTIVE of the document\n\
             - List the MAIN REQUIREMENTS\n\
             - Describe the OVERALL PROCESS in 3-4 steps\n\
             - Mention important DEADLINES\n\
             - At most 200 words\n\n\
             SECTION SUMMARIES:\n{}\n\nGLOBAL SUMMARY:",
            sections_text
        );

        match self
            .gateway
            .generate(&prompt, &GenerateOptions::new(0.3, 1024))
            .await
        {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                if self.options.verbose {
                    eprintln!("[INDEX] global summary failed ({}), reusing first batch", e);
                }
                sections
                    .first()
                    .map(|s| s.summary.clone())
                    .unwrap_or_else(|| "Summary unavailable".to_string())
            }
        }
    }
}

/// Keep the first `max` whitespace-separated words
fn truncate_words(text: &str, max: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().take(max).collect();
    let mut out = words.join(" ");
    if text.split_whitespace().nth(max).is_some() {
        out.push_str("...");
    }
    out
}
