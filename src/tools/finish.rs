//! Termination tool
//!
//! Invoking `finish` signals that the agent has enough information; the
//! loop returns its structured summary directly as the final answer.

use crate::tools::{Tool, ToolDefinition};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct FinishArgs {
    summary: String,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default = "default_confidence")]
    confidence: String,
}

fn default_confidence() -> String {
    "medium".to_string()
}

/// Ends the reasoning loop with a consolidated answer
pub struct FinishTool;

#[async_trait]
impl Tool for FinishTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "finish",
            "End the search and produce the final answer from the information \
             gathered. Use this tool when you have enough information to answer.",
            json!({
                "type": "object",
                "properties": {
                    "summary": {
                        "type": "string",
                        "description": "Summary of the main findings for the user"
                    },
                    "sources": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Sources consulted (SQL queries, documents)"
                    },
                    "confidence": {
                        "type": "string",
                        "enum": ["high", "medium", "low"],
                        "description": "Confidence level of the answer"
                    }
                },
                "required": ["summary"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Value {
        let args: FinishArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return json!({"error": format!("invalid arguments: {}", e)}),
        };

        json!({
            "summary": args.summary,
            "sources": args.sources,
            "confidence": args.confidence,
            "finished": true
        })
    }
}
