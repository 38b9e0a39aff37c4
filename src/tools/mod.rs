//! Tool runtime for the search agent
//!
//! Tools are a closed set registered in an immutable [`ToolSet`] built once
//! and handed to the agent constructor. Dispatch is a table lookup by name;
//! concurrent agent instances holding clones of the same set stay
//! independent because the set is never mutated after construction.
//!
//! Tools never raise: every failure is reported as an `{"error": ...}` field
//! inside the JSON result so the reasoning loop can observe it and replan.

pub mod documents;
pub mod finish;
pub mod security;
pub mod sql;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub use documents::{ListDocumentsTool, ReadDocumentTool};
pub use finish::FinishTool;
pub use security::PathJail;
pub use sql::{QueryExecutor, StructuredQueryTool};

/// Name of the designated termination tool
pub const FINISH_TOOL: &str = "finish";

/// Tool definition advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Parameter schema (JSON Schema)
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A registered tool: a definition plus an execution entry point.
///
/// `execute` takes the raw argument object selected by the model and returns
/// a JSON result. Implementations must capture their own failures as an
/// `{"error": ...}` field instead of panicking or returning `Err`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition advertised to the model
    fn definition(&self) -> ToolDefinition;

    /// Execute with the given arguments; never raises
    async fn execute(&self, args: Value) -> Value;
}

/// Immutable set of tools keyed by name
#[derive(Clone)]
pub struct ToolSet {
    tools: Arc<HashMap<String, Arc<dyn Tool>>>,
    definitions: Arc<Vec<ToolDefinition>>,
}

impl ToolSet {
    /// Start building a tool set
    pub fn builder() -> ToolSetBuilder {
        ToolSetBuilder { tools: Vec::new() }
    }

    /// Definitions of all registered tools, in registration order
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name.
    ///
    /// An unknown name yields an `{"error": ...}` result like any other tool
    /// failure, so the loop can observe it rather than crash.
    pub async fn execute(&self, name: &str, args: Value) -> Value {
        match self.tools.get(name) {
            Some(tool) => tool.execute(args).await,
            None => json!({
                "error": format!("unknown tool: {}", name),
                "available": self.definitions.iter().map(|d| d.name.clone()).collect::<Vec<_>>(),
            }),
        }
    }
}

/// Builder for [`ToolSet`]
pub struct ToolSetBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSetBuilder {
    /// Register a tool
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Finalize into an immutable set. Later registrations win on name
    /// collision.
    pub fn build(self) -> ToolSet {
        let definitions: Vec<ToolDefinition> =
            self.tools.iter().map(|t| t.definition()).collect();
        let mut map = HashMap::new();
        for tool in self.tools {
            map.insert(tool.definition().name, tool);
        }
        ToolSet {
            tools: Arc::new(map),
            definitions: Arc::new(definitions),
        }
    }
}
