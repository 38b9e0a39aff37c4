//! Judge retrieval integration tests: concurrent evaluation, ranking, and
//! the zero-score degradation for malformed evaluations

mod common;

use common::RuleGateway;
use docscout::retrieval::{JudgeRetrieval, RetrievalMethod, RetrievalStatus};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_corpus(dir: &Path) {
    for (code, body) in [
        ("PROC-AAA-001", "Early retirement requirements and steps."),
        ("PROC-BBB-002", "Transfer procedure between administrators."),
        ("PROC-CCC-003", "Claims handling workflow."),
        ("PROC-DDD-004", "Employer collections process."),
    ] {
        fs::write(
            dir.join(format!("{}.txt", code.to_lowercase())),
            format!("CODE: {}\n{}", code, body),
        )
        .unwrap();
    }
}

#[tokio::test]
async fn judge_ranks_by_score_and_excludes_failed_evaluations() {
    let docs = TempDir::new().unwrap();
    write_corpus(docs.path());

    // Two parseable evaluations, one malformed reply, one gateway error
    let gateway = Arc::new(
        RuleGateway::new()
            .reply(
                "PROC-AAA-001",
                r#"{"relevance_score": 0.4, "reasoning": "partially related", "relevant_sections": []}"#,
            )
            .reply(
                "PROC-BBB-002",
                r#"{"relevance_score": 0.9, "reasoning": "directly relevant", "relevant_sections": ["STEPS"]}"#,
            )
            .reply("PROC-CCC-003", "this is not json at all")
            .fail("PROC-DDD-004", "model overloaded"),
    );

    let judge = JudgeRetrieval::new(gateway, docs.path());
    let result = judge.retrieve("how do I transfer my account?", 5).await.unwrap();

    // The whole call must not raise, and failed evaluations are excluded
    assert_eq!(result.method, RetrievalMethod::JudgeLlm);
    assert_eq!(result.status, RetrievalStatus::Ok);
    assert_eq!(result.chunks.len(), 2);

    // Descending by score
    assert_eq!(result.chunks[0].metadata.code, "PROC-BBB-002");
    assert!((result.chunks[0].score - 0.9).abs() < 1e-6);
    assert_eq!(result.chunks[1].metadata.code, "PROC-AAA-001");

    // Citation tagged distinctly from the index-guided path
    assert_eq!(
        result.chunks[0].citation,
        "[Doc: PROC-BBB-002 (general), LLM relevance: 90%]"
    );
    assert_eq!(result.chunks[0].reasoning.as_deref(), Some("directly relevant"));
}

#[tokio::test]
async fn judge_truncates_to_k() {
    let docs = TempDir::new().unwrap();
    write_corpus(docs.path());

    let gateway = Arc::new(
        RuleGateway::new()
            .reply("PROC-AAA-001", r#"{"relevance_score": 0.7, "reasoning": "a"}"#)
            .reply("PROC-BBB-002", r#"{"relevance_score": 0.9, "reasoning": "b"}"#)
            .reply("PROC-CCC-003", r#"{"relevance_score": 0.8, "reasoning": "c"}"#)
            .reply("PROC-DDD-004", r#"{"relevance_score": 0.6, "reasoning": "d"}"#),
    );

    let judge = JudgeRetrieval::new(gateway, docs.path());
    let result = judge.retrieve("anything", 2).await.unwrap();

    assert_eq!(result.chunks.len(), 2);
    assert_eq!(result.chunks[0].metadata.code, "PROC-BBB-002");
    assert_eq!(result.chunks[1].metadata.code, "PROC-CCC-003");
}

#[tokio::test]
async fn judge_with_no_scorable_documents_refuses() {
    let docs = TempDir::new().unwrap();
    write_corpus(docs.path());

    let gateway = Arc::new(RuleGateway::new().reply("Evaluate the relevance", "no json here"));

    let judge = JudgeRetrieval::new(gateway, docs.path());
    let result = judge.retrieve("anything", 5).await.unwrap();

    assert_eq!(result.status, RetrievalStatus::NoRelevantDocuments);
    assert!(result.chunks.is_empty());
    assert!(result.message.is_some());
}

#[tokio::test]
async fn judge_scores_are_clamped() {
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("doc.txt"), "CODE: PROC-EEE-005\nbody").unwrap();

    let gateway = Arc::new(RuleGateway::new().reply(
        "PROC-EEE-005",
        r#"{"relevance_score": 3.5, "reasoning": "overconfident"}"#,
    ));

    let judge = JudgeRetrieval::new(gateway, docs.path());
    let result = judge.retrieve("anything", 5).await.unwrap();

    assert_eq!(result.chunks.len(), 1);
    assert!(result.chunks[0].score <= 1.0);
}
