//! Full-document judge retrieval
//!
//! The fallback strategy when no index exists: every document under the
//! corpus directory is read in full and scored for relevance by the model,
//! with all evaluations issued concurrently and joined before ranking. One
//! malformed or failed evaluation scores that document 0.0; it can never
//! fail the retrieval as a whole.

use crate::errors::Result;
use crate::gateway::{structured, GenerateOptions, ModelGateway};
use crate::retrieval::types::{
    Chunk, ChunkMetadata, ContentSource, RetrievalMethod, RetrievalResult, RetrievalStatus,
};
use crate::source::{self, RawDocument};
use futures_util::future::join_all;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Per-document evaluation reply shape
#[derive(Debug, Deserialize)]
struct EvaluationReply {
    relevance_score: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    relevant_sections: Vec<String>,
}

/// One scored evaluation, joined back to its document
struct Evaluation {
    score: f64,
    reasoning: String,
    relevant_sections: Vec<String>,
}

/// LLM-as-judge retrieval over whole documents
pub struct JudgeRetrieval {
    gateway: Arc<dyn ModelGateway>,
    documents_dir: PathBuf,
    verbose: bool,
}

impl JudgeRetrieval {
    /// Create a judge over a document directory
    pub fn new(gateway: Arc<dyn ModelGateway>, documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            documents_dir: documents_dir.into(),
            verbose: false,
        }
    }

    /// Enable progress logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Evaluate every document against the query and return the top `k`.
    ///
    /// Documents whose evaluation failed (score 0.0) are excluded from the
    /// ranking; an empty corpus or an all-failed round yields an explicit
    /// no-grounding result.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let start = Instant::now();

        let documents = source::read_all_documents(&self.documents_dir)?;
        if self.verbose {
            eprintln!(
                "[JUDGE] evaluating {} documents concurrently",
                documents.len()
            );
        }

        // Fan-out: all evaluations in flight at once, joined before ranking
        let evaluations =
            join_all(documents.iter().map(|doc| self.evaluate(query, doc))).await;

        let mut scored: Vec<(&RawDocument, Evaluation)> = documents
            .iter()
            .zip(evaluations)
            .filter(|(_, eval)| eval.score > 0.0)
            .collect();

        // Stable descending sort: ties keep corpus read order
        scored.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        if scored.is_empty() {
            let mut result = RetrievalResult::no_grounding(
                RetrievalMethod::JudgeLlm,
                RetrievalStatus::NoRelevantDocuments,
                "No relevant documents were found for this query.",
            );
            result.elapsed_ms = start.elapsed().as_millis() as u64;
            return Ok(result);
        }

        let chunks = scored
            .into_iter()
            .map(|(doc, eval)| {
                let score = eval.score.clamp(0.0, 1.0) as f32;
                Chunk {
                    content: doc.content.clone(),
                    metadata: ChunkMetadata {
                        document_id: doc.id.clone(),
                        code: doc.meta.code.clone(),
                        category: doc.meta.category.clone(),
                        section_id: None,
                        section_title: eval.relevant_sections.first().cloned(),
                        page_range: None,
                        content_source: ContentSource::FullDocument,
                    },
                    score,
                    citation: format_citation(&doc.meta.code, &doc.meta.category, score),
                    reasoning: Some(eval.reasoning),
                }
            })
            .collect();

        Ok(RetrievalResult {
            answer: None,
            chunks,
            method: RetrievalMethod::JudgeLlm,
            status: RetrievalStatus::Ok,
            message: None,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Score one document. Every failure path lands on score 0.0.
    async fn evaluate(&self, query: &str, document: &RawDocument) -> Evaluation {
        let prompt = format!(
            "Evaluate the relevance of the following document for the user's question.\n\n\
             USER QUESTION:\n{}\n\n\
             DOCUMENT:\n\
             Category: {}\n\
             Title: {}\n\
             Code: {}\n\n\
             CONTENT:\n{}\n\n\
             INSTRUCTIONS:\n\
             1. Score how relevant this document is to the question (0 to 1)\n\
             2. Briefly explain why it is or is not relevant\n\
             3. Name the most relevant sections of the document\n\n\
             Reply ONLY with a valid JSON object in this format:\n\
             {{\"relevance_score\": 0.85, \"reasoning\": \"...\", \"relevant_sections\": [\"REQUIREMENTS\"]}}",
            query, document.meta.category, document.meta.title, document.meta.code, document.content
        );

        let reply = match self
            .gateway
            .generate(&prompt, &GenerateOptions::new(0.3, 1024))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                return Evaluation {
                    score: 0.0,
                    reasoning: format!("Evaluation failed: {}", e),
                    relevant_sections: Vec::new(),
                };
            }
        };

        match structured::extract::<EvaluationReply>(&reply) {
            Ok(parsed) => Evaluation {
                score: parsed.relevance_score.clamp(0.0, 1.0),
                reasoning: parsed.reasoning,
                relevant_sections: parsed.relevant_sections,
            },
            Err(_) => Evaluation {
                score: 0.0,
                reasoning: "Could not parse the evaluation reply".to_string(),
                relevant_sections: Vec::new(),
            },
        }
    }
}

/// Citation tagged distinctly from the index-guided path
fn format_citation(code: &str, category: &str, score: f32) -> String {
    format!(
        "[Doc: {} ({}), LLM relevance: {}%]",
        code,
        category,
        (score * 100.0).round() as u32
    )
}
