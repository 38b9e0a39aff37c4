//! Index-guided retrieval engine
//!
//! Three phases, each one gateway call over compact index text instead of
//! raw documents:
//!
//! 1. document filter — all indices in one prompt, structured id decision
//! 2. section filter — per relevant document, structured section decision
//! 3. content load + synthesis — only the selected page ranges are read,
//!    then one final grounded-answer call
//!
//! Each phase sees an order of magnitude less text than reading whole
//! documents; that trade is the point of the strategy. When no indices
//! exist the engine transparently falls back to judge retrieval.

use crate::errors::Result;
use crate::gateway::{structured, GenerateOptions, ModelGateway};
use crate::index::{DocumentIndex, IndexStore, Section};
use crate::retrieval::judge::JudgeRetrieval;
use crate::retrieval::types::{
    Chunk, ChunkMetadata, ContentSource, RetrievalMethod, RetrievalResult, RetrievalStatus,
};
use crate::source;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Retrieval tuning parameters
#[derive(Debug, Clone)]
pub struct RetrievalParams {
    /// Documents returned by the judge fallback
    pub top_k: usize,

    /// Hard cap on sections loaded per document
    pub max_sections_per_document: usize,

    /// Enable progress logging
    pub verbose: bool,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_sections_per_document: 5,
            verbose: false,
        }
    }
}

/// Phase 1 reply shape
#[derive(Debug, Deserialize)]
struct DocumentFilterReply {
    #[serde(default)]
    relevant_documents: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

/// Phase 2 reply shape
#[derive(Debug, Deserialize)]
struct SectionFilterReply {
    #[serde(default)]
    relevant_sections: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

/// A section with its loaded content, ready for synthesis
struct SectionContent {
    document_id: String,
    code: String,
    category: String,
    section_id: String,
    section_title: String,
    page_range: crate::index::PageRange,
    content: String,
    content_source: ContentSource,
}

impl SectionContent {
    fn citation(&self) -> String {
        format!(
            "[{} - {}, pages {}]",
            self.code,
            self.section_title,
            self.page_range.label()
        )
    }
}

/// The three-phase index-guided retrieval engine
pub struct IndexGuidedRetrieval {
    gateway: Arc<dyn ModelGateway>,
    store: IndexStore,
    documents_dir: PathBuf,
    params: RetrievalParams,
}

impl IndexGuidedRetrieval {
    /// Create an engine over an index store and a document directory
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        store: IndexStore,
        documents_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            gateway,
            store,
            documents_dir: documents_dir.into(),
            params: RetrievalParams::default(),
        }
    }

    /// Override parameters
    pub fn with_params(mut self, params: RetrievalParams) -> Self {
        self.params = params;
        self
    }

    /// Run the three-phase pipeline for a query.
    ///
    /// A missing or empty index directory falls back to judge retrieval; an
    /// unparseable or empty phase-1 decision returns an explicit
    /// no-relevant-documents result and never proceeds to later phases.
    pub async fn retrieve_with_index(&self, query: &str) -> Result<RetrievalResult> {
        let start = Instant::now();

        let indices = self.store.load_all();
        if indices.is_empty() {
            if self.params.verbose {
                eprintln!("[RETRIEVE] no indices available, falling back to judge retrieval");
            }
            let judge = JudgeRetrieval::new(self.gateway.clone(), self.documents_dir.clone())
                .with_verbose(self.params.verbose);
            return judge.retrieve(query, self.params.top_k).await;
        }

        if self.params.verbose {
            eprintln!("[RETRIEVE] phase 1: filtering {} indices", indices.len());
        }

        let relevant = self.filter_documents(query, &indices).await;
        if relevant.is_empty() {
            let mut result = RetrievalResult::no_grounding(
                RetrievalMethod::IndexGuided,
                RetrievalStatus::NoRelevantDocuments,
                "No relevant documents were found for this query.",
            );
            result.elapsed_ms = start.elapsed().as_millis() as u64;
            return Ok(result);
        }

        if self.params.verbose {
            let ids: Vec<&str> = relevant.iter().map(|i| i.document_id.as_str()).collect();
            eprintln!("[RETRIEVE] phase 2: relevant documents {:?}", ids);
        }

        let mut sections_content = Vec::new();
        for index in &relevant {
            let section_ids = self.filter_sections(query, index).await;
            if self.params.verbose {
                eprintln!(
                    "[RETRIEVE]   {}: sections {:?}",
                    index.document_id, section_ids
                );
            }
            sections_content.extend(self.load_sections(index, &section_ids));
        }

        if sections_content.is_empty() {
            let mut result = RetrievalResult::no_grounding(
                RetrievalMethod::IndexGuided,
                RetrievalStatus::NoRelevantSections,
                "Relevant documents were found but no section content could be loaded.",
            );
            result.elapsed_ms = start.elapsed().as_millis() as u64;
            return Ok(result);
        }

        if self.params.verbose {
            eprintln!(
                "[RETRIEVE] phase 3: synthesizing from {} sections",
                sections_content.len()
            );
        }

        let result = match self.synthesize(query, &sections_content).await {
            Ok(answer) => {
                let chunks = sections_content
                    .iter()
                    .map(|sc| Chunk {
                        content: sc.content.clone(),
                        metadata: ChunkMetadata {
                            document_id: sc.document_id.clone(),
                            code: sc.code.clone(),
                            category: sc.category.clone(),
                            section_id: Some(sc.section_id.clone()),
                            section_title: Some(sc.section_title.clone()),
                            page_range: Some(sc.page_range),
                            content_source: sc.content_source,
                        },
                        // Already filtered by phases 1-2
                        score: 1.0,
                        citation: sc.citation(),
                        reasoning: Some(format!("Relevant section: {}", sc.section_title)),
                    })
                    .collect();

                RetrievalResult {
                    answer: Some(answer),
                    chunks,
                    method: RetrievalMethod::IndexGuided,
                    status: RetrievalStatus::Ok,
                    message: None,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                }
            }
            Err(e) => {
                let mut result = RetrievalResult::no_grounding(
                    RetrievalMethod::IndexGuided,
                    RetrievalStatus::SynthesisFailed,
                    format!("Content was retrieved but answer synthesis failed: {}", e),
                );
                result.elapsed_ms = start.elapsed().as_millis() as u64;
                result
            }
        };

        Ok(result)
    }

    /// Phase 1: one gateway call over every index summary.
    ///
    /// Any failure (gateway or parse) yields the empty list; the caller
    /// turns that into an explicit refusal rather than guessing.
    async fn filter_documents<'a>(
        &self,
        query: &str,
        indices: &'a [DocumentIndex],
    ) -> Vec<&'a DocumentIndex> {
        let listing = indices
            .iter()
            .map(|index| {
                format!(
                    "Document: {}\nCode: {}\nTitle: {}\nCategory: {}\nSummary: {}\nSections: {}",
                    index.document_id,
                    index.metadata.code,
                    index.title,
                    index.category,
                    index.summary,
                    index.sections.len()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "You have these documents available (indices):\n\n{}\n\n\
             User question: {}\n\n\
             Which documents are RELEVANT to answering this question?\n\n\
             Reply ONLY with a valid JSON object (no markdown, no extra commentary):\n\
             {{\"relevant_documents\": [\"doc_id_1\", \"doc_id_2\"], \"reasoning\": \"brief explanation\"}}\n\n\
             If no document is relevant, return an empty array.",
            listing, query
        );

        let reply = match self
            .gateway
            .generate(&prompt, &GenerateOptions::new(0.3, 512))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                if self.params.verbose {
                    eprintln!("[RETRIEVE] phase 1 gateway error: {}", e);
                }
                return Vec::new();
            }
        };

        let decision = match structured::extract::<DocumentFilterReply>(&reply) {
            Ok(d) => d,
            Err(e) => {
                if self.params.verbose {
                    eprintln!("[RETRIEVE] phase 1 parse error: {}", e);
                }
                return Vec::new();
            }
        };

        if self.params.verbose && !decision.reasoning.is_empty() {
            eprintln!("[RETRIEVE] phase 1 reasoning: {}", decision.reasoning);
        }

        decision
            .relevant_documents
            .iter()
            .filter_map(|id| indices.iter().find(|index| &index.document_id == id))
            .collect()
    }

    /// Phase 2: one gateway call over one document's section summaries.
    ///
    /// Parse failure selects *all* sections — recall over precision when
    /// uncertain.
    async fn filter_sections(&self, query: &str, index: &DocumentIndex) -> Vec<String> {
        let listing = index
            .sections
            .iter()
            .map(|s| {
                format!(
                    "Section {}: {}\nPages: {}\nSummary: {}",
                    s.section_id,
                    s.title,
                    s.page_range.label(),
                    s.summary
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Document: {}\nCode: {}\n\n\
             Section index:\n{}\n\n\
             User question: {}\n\n\
             Which sections do you need to read to answer this question?\n\n\
             Reply ONLY with a valid JSON object (no markdown, no extra commentary):\n\
             {{\"relevant_sections\": [\"1\", \"5\"], \"reasoning\": \"brief explanation\"}}\n\n\
             Select ONLY the sections strictly necessary (at most 3-5). If unsure,\n\
             prefer including one section too many over leaving one out.",
            index.title, index.metadata.code, listing, query
        );

        let all_ids = || {
            index
                .sections
                .iter()
                .map(|s| s.section_id.clone())
                .collect::<Vec<_>>()
        };

        let reply = match self
            .gateway
            .generate(&prompt, &GenerateOptions::new(0.3, 512))
            .await
        {
            Ok(text) => text,
            Err(_) => return all_ids(),
        };

        let mut ids = match structured::extract::<SectionFilterReply>(&reply) {
            Ok(decision) => decision.relevant_sections,
            Err(_) => all_ids(),
        };

        ids.truncate(self.params.max_sections_per_document);
        ids
    }

    /// Phase 3a: load content for the selected sections of one document.
    ///
    /// The page-addressed read is the primary path. When the source has no
    /// page semantics for the indexed range, content is recovered by
    /// matching the section title against structural headers; when even
    /// that fails the section summary is substituted and marked so the
    /// consumer can see the span is not primary text.
    fn load_sections(&self, index: &DocumentIndex, section_ids: &[String]) -> Vec<SectionContent> {
        let Some(source_path) = self.resolve_source(index) else {
            if self.params.verbose {
                eprintln!(
                    "[RETRIEVE] source file {} not found, skipping {}",
                    index.source_file, index.document_id
                );
            }
            return Vec::new();
        };

        let mut loaded = Vec::new();

        for section_id in section_ids {
            let Some(section) = index.section(section_id) else {
                continue;
            };

            let (content, content_source) = self.load_section_content(&source_path, section);

            loaded.push(SectionContent {
                document_id: index.document_id.clone(),
                code: index.metadata.code.clone(),
                category: index.category.clone(),
                section_id: section.section_id.clone(),
                section_title: section.title.clone(),
                page_range: section.page_range,
                content,
                content_source,
            });
        }

        loaded
    }

    fn load_section_content(
        &self,
        path: &std::path::Path,
        section: &Section,
    ) -> (String, ContentSource) {
        if let Ok(source) = source::open_source(path) {
            if let Ok(text) =
                source.read_page_range(section.page_range.start, section.page_range.end)
            {
                return (text, ContentSource::Pages);
            }

            if let Ok(pages) = source.read_pages() {
                let full_text = pages
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                if let Some(text) = extract_section_by_title(&full_text, &section.title) {
                    return (text, ContentSource::HeaderMatch);
                }
            }
        }

        (section.summary.clone(), ContentSource::SummaryFallback)
    }

    /// Locate the source file named by the index under the documents tree
    fn resolve_source(&self, index: &DocumentIndex) -> Option<PathBuf> {
        let direct = self.documents_dir.join(&index.source_file);
        if direct.is_file() {
            return Some(direct);
        }

        source::discover_documents(&self.documents_dir)
            .ok()?
            .into_iter()
            .find(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy() == index.source_file.as_str())
                    .unwrap_or(false)
            })
    }

    /// Phase 3b: the final grounded-answer call
    async fn synthesize(&self, query: &str, sections: &[SectionContent]) -> Result<String> {
        let formatted = sections
            .iter()
            .map(|sc| format!("{}\n\n{}", sc.citation(), sc.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "User question: {}\n\n\
             Relevant content from the document corpus:\n\n{}\n\n\
             Write a clear and concise answer that:\n\
             1. Directly answers the question\n\
             2. Uses information ONLY from the content provided above\n\
             3. Cites sources with the exact markers shown, e.g. [PROC-XXX-NNN - Section Title, pages X-Y]\n\
             4. Is precise and professional\n\n\
             Answer:",
            query, formatted
        );

        let answer = self
            .gateway
            .generate(&prompt, &GenerateOptions::new(0.5, 1024))
            .await?;

        Ok(answer.trim().to_string())
    }
}

/// Extract a section's text by matching its title against structural
/// headers in the full document.
///
/// Tries a markdown header match first, then a plain case-insensitive line
/// match, capturing up to the next header. Returns `None` when the title
/// cannot be located — the caller decides how to degrade.
fn extract_section_by_title(full_text: &str, title: &str) -> Option<String> {
    let pattern = format!(
        r"(?ms)^#{{1,3}}\s+{}\s*$.*?(?=^#{{1,3}}\s|\z)",
        regex::escape(title)
    );
    if let Ok(re) = Regex::new(&pattern) {
        if let Some(m) = re.find(full_text) {
            let text = m.as_str().trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    let lowered = title.to_lowercase();
    let lines: Vec<&str> = full_text.lines().collect();
    let start = lines
        .iter()
        .position(|line| line.to_lowercase().contains(&lowered))?;

    let end = lines[start + 1..]
        .iter()
        .position(|line| line.trim_start().starts_with("##"))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    let text = lines[start..end].join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
