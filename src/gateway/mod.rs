//! Language model gateway boundary
//!
//! One capability surface for everything the engine needs from a model:
//! prompt completion, completion with tool selection, and text embedding.
//! The engine only ever talks to [`ModelGateway`]; the bundled
//! [`HttpGateway`] implementation speaks an Ollama-style HTTP protocol, and
//! tests substitute scripted gateways.

pub mod http;
pub mod structured;

use crate::errors::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;

pub use http::HttpGateway;

/// Generation parameters for a single gateway call
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl GenerateOptions {
    /// Create options with explicit values
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        // Low temperature: evaluation and filtering calls need consistency
        Self {
            temperature: 0.3,
            max_tokens: 1024,
        }
    }
}

/// Reply from a generation call that offered tools
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayReply {
    /// The model answered in free text
    Text(String),

    /// The model selected exactly one tool to run
    ToolCall {
        /// Registered tool name
        name: String,
        /// Argument object matching the tool's parameter schema
        arguments: Value,
    },
}

/// Capability boundary for language model invocation
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Complete a prompt into text
    async fn generate(&self, prompt: &str, opts: &GenerateOptions) -> Result<String>;

    /// Complete a prompt, allowing the model to select one of the offered
    /// tools instead of answering in text
    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[ToolDefinition],
        opts: &GenerateOptions,
    ) -> Result<GatewayReply>;

    /// Embed text into a fixed-size vector (768 dimensions)
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
