//! HTTP model gateway client
//!
//! Speaks an Ollama-style API: `POST /api/generate` for completion and
//! `POST /api/embeddings` for vectors. Tool selection is realized at the
//! prompt level: the tool definitions are embedded in the prompt and a JSON
//! `{"tool": ..., "arguments": ...}` reply is recognized through the
//! structured parser; anything else is treated as free text.

use crate::errors::{EngineError, Result};
use crate::gateway::{structured, GatewayReply, GenerateOptions, ModelGateway};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// HTTP client for a model gateway endpoint
pub struct HttpGateway {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Shape of a tool-selection reply emitted by the model
#[derive(Debug, Deserialize)]
struct ToolSelection {
    tool: String,
    #[serde(default)]
    arguments: Value,
}

impl HttpGateway {
    /// Create a new gateway client
    ///
    /// # Arguments
    /// * `base_url` - Gateway base URL (e.g. `http://127.0.0.1:11434`)
    /// * `model` - Model name to request
    /// * `timeout_secs` - Per-call timeout; outstanding calls are aborted
    ///   when it elapses and surface as a recoverable gateway error
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EngineError::Gateway(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    /// Check if the gateway is reachable
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        self.client
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .is_ok()
    }

    /// Render tool definitions into the prompt preamble
    fn format_tool_preamble(tools: &[ToolDefinition]) -> String {
        let mut lines = vec![
            "You can either answer in plain text, or invoke exactly one of these tools.".to_string(),
            "To invoke a tool, reply with ONLY a JSON object of the form:".to_string(),
            r#"{"tool": "<name>", "arguments": {<parameters>}}"#.to_string(),
            String::new(),
            "Available tools:".to_string(),
        ];

        for tool in tools {
            lines.push(format!(
                "- {}: {}\n  parameters: {}",
                tool.name, tool.description, tool.parameters
            ));
        }

        lines.join("\n")
    }
}

#[async_trait]
impl ModelGateway for HttpGateway {
    async fn generate(&self, prompt: &str, opts: &GenerateOptions) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": opts.temperature,
                "num_predict": opts.max_tokens,
            },
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(EngineError::Gateway(format!(
                "gateway returned {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Gateway(format!("malformed generate response: {}", e)))?;

        Ok(parsed.response)
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[ToolDefinition],
        opts: &GenerateOptions,
    ) -> Result<GatewayReply> {
        let full_prompt = if tools.is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n\n{}", Self::format_tool_preamble(tools), prompt)
        };

        let text = self.generate(&full_prompt, opts).await?;

        // A reply is a tool call only when it carries a "tool" field naming
        // one of the offered tools; everything else stays free text.
        match structured::extract::<ToolSelection>(&text) {
            Ok(selection) if tools.iter().any(|t| t.name == selection.tool) => {
                Ok(GatewayReply::ToolCall {
                    name: selection.tool,
                    arguments: if selection.arguments.is_null() {
                        json!({})
                    } else {
                        selection.arguments
                    },
                })
            }
            _ => Ok(GatewayReply::Text(text)),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let body = json!({
            "model": self.model,
            "prompt": text,
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(EngineError::Gateway(format!(
                "gateway returned {}",
                response.status()
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Gateway(format!("malformed embeddings response: {}", e)))?;

        Ok(parsed.embedding)
    }
}
