//! Document filesystem tools
//!
//! - `list_documents`: names and metadata only, no content, so the agent
//!   can see what exists before spending a read on it
//! - `read_document`: full content of one file by exact name
//!
//! Both are jailed to the configured base directory; a resolved path that
//! escapes it comes back as an `{"error": ...}` result.

use crate::tools::security::PathJail;
use crate::tools::{Tool, ToolDefinition};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions listed per file-type filter
fn extensions_for(file_type: &str) -> Vec<&'static str> {
    match file_type {
        "pdf" => vec![".pdf"],
        "txt" => vec![".txt"],
        "md" => vec![".md"],
        "docx" => vec![".docx", ".doc"],
        _ => vec![".pdf", ".txt", ".md", ".docx", ".doc"],
    }
}

/// Coarse document kind derived from the file name
fn classify(filename: &str) -> &'static str {
    let lowered = filename.to_lowercase();
    const KINDS: [(&str, &str); 6] = [
        ("certificado", "certificate"),
        ("certificate", "certificate"),
        ("traspaso", "transfer"),
        ("transfer", "transfer"),
        ("reclamo", "claim"),
        ("claim", "claim"),
    ];
    for (needle, kind) in KINDS {
        if lowered.contains(needle) {
            return kind;
        }
    }
    if lowered.contains("pension") {
        return "pension";
    }
    "unknown"
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default)]
    filter_pattern: String,
    #[serde(default)]
    file_type: String,
}

/// Lists documents under the base directory (names and metadata only)
pub struct ListDocumentsTool {
    base: PathBuf,
}

impl ListDocumentsTool {
    /// Create the tool over a base directory
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn walk(&self, dir: &Path, extensions: &[&str], pattern: Option<&Regex>, out: &mut Vec<Value>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, extensions, pattern, out);
                continue;
            }

            let filename = entry.file_name().to_string_lossy().to_string();
            let lowered = filename.to_lowercase();
            if !extensions.iter().any(|ext| lowered.ends_with(ext)) {
                continue;
            }
            if let Some(re) = pattern {
                if !re.is_match(&filename) {
                    continue;
                }
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            out.push(json!({
                "filename": filename,
                "type": classify(&filename),
                "size_bytes": size,
                "extension": path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default(),
            }));
        }
    }
}

#[async_trait]
impl Tool for ListDocumentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_documents",
            "List the documents available on the filesystem, like 'ls' or 'tree'. \
             Returns names and metadata, NOT content. Use filter_pattern to filter \
             by name (e.g. 'certificate', '12345678-9').",
            json!({
                "type": "object",
                "properties": {
                    "filter_pattern": {
                        "type": "string",
                        "description": "Optional pattern to filter file names (text or regex). Empty lists everything.",
                        "default": ""
                    },
                    "file_type": {
                        "type": "string",
                        "enum": ["pdf", "txt", "md", "docx", "all"],
                        "description": "File type to list",
                        "default": "all"
                    }
                },
                "required": []
            }),
        )
    }

    async fn execute(&self, args: Value) -> Value {
        let args: ListArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return json!({"error": format!("invalid arguments: {}", e), "documents": [], "count": 0}),
        };

        if !self.base.is_dir() {
            return json!({
                "error": "document directory does not exist",
                "documents": [],
                "count": 0
            });
        }

        // Invalid regex degrades to a literal substring match
        let pattern = if args.filter_pattern.is_empty() {
            None
        } else {
            Regex::new(&format!("(?i){}", &args.filter_pattern))
                .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(&args.filter_pattern))))
                .ok()
        };

        let file_type = if args.file_type.is_empty() {
            "all".to_string()
        } else {
            args.file_type
        };
        let extensions = extensions_for(&file_type);

        let mut documents = Vec::new();
        self.walk(&self.base, &extensions, pattern.as_ref(), &mut documents);
        documents.sort_by(|a, b| {
            a["filename"]
                .as_str()
                .unwrap_or("")
                .cmp(b["filename"].as_str().unwrap_or(""))
        });

        json!({
            "filter_pattern": if args.filter_pattern.is_empty() { "(none)".to_string() } else { args.filter_pattern },
            "file_type": file_type,
            "count": documents.len(),
            "documents": documents,
            "hint": "Use read_document(filename) to read the content of a specific document"
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    filename: String,
}

/// Reads the full content of one document by exact name
pub struct ReadDocumentTool {
    base: PathBuf,
    jail: PathJail,
}

impl ReadDocumentTool {
    /// Create the tool; fails only when the base directory is missing
    pub fn new(base: impl Into<PathBuf>) -> crate::errors::Result<Self> {
        let base = base.into();
        let jail = PathJail::new(&base)?;
        Ok(Self { base, jail })
    }

    /// Locate a file by name, searching subdirectories when it is not at
    /// the top level
    fn find_file(&self, filename: &str) -> Option<PathBuf> {
        let direct = self.base.join(filename);
        if direct.is_file() {
            return Some(direct);
        }
        self.find_in(&self.base, filename)
    }

    fn find_in(&self, dir: &Path, filename: &str) -> Option<PathBuf> {
        for entry in fs::read_dir(dir).ok()?.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if let Some(found) = self.find_in(&path, filename) {
                    return Some(found);
                }
            } else if entry.file_name().to_string_lossy() == filename {
                return Some(path);
            }
        }
        None
    }
}

#[async_trait]
impl Tool for ReadDocumentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "read_document",
            "Read the full content of a specific document. Requires the exact file \
             name (use list_documents first to see what is available).",
            json!({
                "type": "object",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Exact name of the file to read (e.g. 'certificate_12345678-9_2024.txt')"
                    }
                },
                "required": ["filename"]
            }),
        )
    }

    async fn execute(&self, args: Value) -> Value {
        let args: ReadArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return json!({"error": format!("invalid arguments: {}", e)}),
        };

        if !self.jail.would_contain(&args.filename) {
            return json!({
                "error": "invalid file name or path traversal attempt",
                "filename": args.filename
            });
        }

        let Some(path) = self.find_file(&args.filename) else {
            return json!({
                "error": format!("document '{}' not found", args.filename),
                "filename": args.filename,
                "hint": "Use list_documents() to see the available documents"
            });
        };

        // Re-verify the resolved path; find_file may have followed symlinks
        let path = match self.jail.verify(&path) {
            Ok(p) => p,
            Err(_) => {
                return json!({
                    "error": "invalid file name or path traversal attempt",
                    "filename": args.filename
                })
            }
        };

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if ext != "txt" && ext != "md" {
            return json!({
                "filename": args.filename,
                "error": format!("only .txt and .md files can be read directly (file is .{})", ext),
                "hint": "PDF and DOCX files require dedicated extraction"
            });
        }

        match fs::read_to_string(&path) {
            Ok(content) => json!({
                "filename": args.filename,
                "size_bytes": content.len(),
                "lines": content.lines().count(),
                "content": content
            }),
            Err(e) => json!({
                "error": format!("error reading document: {}", e),
                "filename": args.filename
            }),
        }
    }
}
