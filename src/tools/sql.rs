//! Structured-query tool
//!
//! Accepts only `SELECT` statements, rejects anything carrying DDL/DML
//! keywords or comment markers, enforces a table allow-list, and appends a
//! row limit when the statement has none. Execution happens behind the
//! [`QueryExecutor`] boundary (the relational store is an external
//! collaborator); the tool itself never raises — every failure comes back
//! as an `{"error": ...}` result with `count: 0`.

use crate::tools::{Tool, ToolDefinition};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, OnceLock};

/// Row limit appended to statements without one
pub const MAX_SQL_ROWS: usize = 100;

/// Keywords that disqualify a statement outright
const FORBIDDEN_KEYWORDS: [&str; 11] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE", "EXEC", "EXECUTE",
    "--", "/*",
];

/// Execution boundary to the relational store
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a validated SELECT and return its rows; errors come back as a
    /// message, never a panic
    async fn fetch(&self, sql: &str) -> std::result::Result<Vec<Map<String, Value>>, String>;
}

/// Validates statements against the whitelist rules
#[derive(Debug, Clone)]
pub struct SqlValidator {
    allowed_tables: Vec<String>,
}

impl SqlValidator {
    /// Create a validator over a table allow-list
    pub fn new(allowed_tables: Vec<String>) -> Self {
        Self {
            allowed_tables: allowed_tables
                .into_iter()
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }

    /// Check one statement; `Err` carries the rejection reason
    pub fn validate(&self, query: &str) -> std::result::Result<(), String> {
        let upper = query.trim().to_uppercase();

        if !upper.starts_with("SELECT") {
            return Err("only SELECT statements are allowed".to_string());
        }

        for keyword in FORBIDDEN_KEYWORDS {
            if upper.contains(keyword) {
                return Err(format!("forbidden keyword: {}", keyword));
            }
        }

        let lower = query.to_lowercase();
        if !self.allowed_tables.iter().any(|t| lower.contains(t)) {
            return Err(format!(
                "no allowed table referenced; valid tables: {}",
                self.allowed_tables.join(", ")
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

fn id_with_dots_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // National id quoted with thousands dots, e.g. '12.345.678-9'
    RE.get_or_init(|| Regex::new(r"'(\d{1,2}\.\d{3}\.\d{3}-[\dkK])'").unwrap())
}

/// Normalize dotted national ids inside string literals so lookups match
/// the dot-free storage format
fn normalize_ids(query: &str) -> String {
    id_with_dots_re()
        .replace_all(query, |caps: &regex::Captures| {
            format!("'{}'", caps[1].replace('.', ""))
        })
        .to_string()
}

/// SELECT-only query tool over an external executor
pub struct StructuredQueryTool {
    executor: Arc<dyn QueryExecutor>,
    validator: SqlValidator,
}

impl StructuredQueryTool {
    /// Create the tool with a table allow-list
    pub fn new(executor: Arc<dyn QueryExecutor>, allowed_tables: Vec<String>) -> Self {
        Self {
            executor,
            validator: SqlValidator::new(allowed_tables),
        }
    }
}

#[async_trait]
impl Tool for StructuredQueryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "sql_query",
            format!(
                "Run a SQL query against the relational store. Only SELECT is allowed. \
                 Available tables: {}",
                self.validator.allowed_tables.join(", ")
            ),
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "SQL statement (SELECT only)"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Value {
        let args: QueryArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => {
                return json!({"error": format!("invalid arguments: {}", e), "results": [], "count": 0})
            }
        };

        let query = normalize_ids(&args.query);

        if let Err(reason) = self.validator.validate(&query) {
            return json!({
                "error": reason,
                "query": query,
                "results": [],
                "count": 0
            });
        }

        let query = if query.to_uppercase().contains("LIMIT") {
            query
        } else {
            format!("{} LIMIT {}", query.trim_end_matches(';').trim_end(), MAX_SQL_ROWS)
        };

        match self.executor.fetch(&query).await {
            Ok(rows) => json!({
                "query": query,
                "count": rows.len(),
                "results": rows,
            }),
            Err(message) => json!({
                "error": message,
                "query": query,
                "results": [],
                "count": 0
            }),
        }
    }
}
