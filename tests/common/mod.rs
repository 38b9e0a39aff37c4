//! Shared test gateways
//!
//! Two scripted stand-ins for the model gateway: a sequential script for
//! agent-loop tests, and a prompt-matching rule gateway for retrieval tests
//! where calls are issued concurrently and arrival order is not fixed.

#![allow(dead_code)]

use async_trait::async_trait;
use docscout::errors::{EngineError, Result};
use docscout::gateway::{GatewayReply, GenerateOptions, ModelGateway};
use docscout::tools::ToolDefinition;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted gateway turn
pub enum Scripted {
    /// Free-text reply
    Text(String),

    /// Tool selection reply
    Tool { name: String, arguments: Value },

    /// Gateway failure
    Error(String),
}

/// Gateway replaying a fixed script, one entry per call
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Scripted>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    fn pop(&self) -> Option<Scripted> {
        self.script.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn generate(&self, _prompt: &str, _opts: &GenerateOptions) -> Result<String> {
        match self.pop() {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Tool { name, arguments }) => {
                Ok(json!({"tool": name, "arguments": arguments}).to_string())
            }
            Some(Scripted::Error(message)) => Err(EngineError::Gateway(message)),
            None => Err(EngineError::Gateway("script exhausted".to_string())),
        }
    }

    async fn generate_with_tools(
        &self,
        _prompt: &str,
        _tools: &[ToolDefinition],
        _opts: &GenerateOptions,
    ) -> Result<GatewayReply> {
        match self.pop() {
            Some(Scripted::Text(text)) => Ok(GatewayReply::Text(text)),
            Some(Scripted::Tool { name, arguments }) => {
                Ok(GatewayReply::ToolCall { name, arguments })
            }
            Some(Scripted::Error(message)) => Err(EngineError::Gateway(message)),
            None => Err(EngineError::Gateway("script exhausted".to_string())),
        }
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.0; 768])
    }
}

/// Gateway answering by prompt-content rules, safe under concurrency
pub struct RuleGateway {
    rules: Vec<(String, Result<String>)>,
}

impl RuleGateway {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Reply with `text` when the prompt contains `needle`
    pub fn reply(mut self, needle: &str, text: &str) -> Self {
        self.rules
            .push((needle.to_string(), Ok(text.to_string())));
        self
    }

    /// Fail when the prompt contains `needle`
    pub fn fail(mut self, needle: &str, message: &str) -> Self {
        self.rules.push((
            needle.to_string(),
            Err(EngineError::Gateway(message.to_string())),
        ));
        self
    }
}

#[async_trait]
impl ModelGateway for RuleGateway {
    async fn generate(&self, prompt: &str, _opts: &GenerateOptions) -> Result<String> {
        for (needle, reply) in &self.rules {
            if prompt.contains(needle.as_str()) {
                return match reply {
                    Ok(text) => Ok(text.clone()),
                    Err(EngineError::Gateway(m)) => Err(EngineError::Gateway(m.clone())),
                    Err(_) => Err(EngineError::Gateway("rule error".to_string())),
                };
            }
        }
        let preview: String = prompt.chars().take(80).collect();
        Err(EngineError::Gateway(format!(
            "no rule matched prompt: {}",
            preview
        )))
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        _tools: &[ToolDefinition],
        opts: &GenerateOptions,
    ) -> Result<GatewayReply> {
        self.generate(prompt, opts).await.map(GatewayReply::Text)
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.0; 768])
    }
}
