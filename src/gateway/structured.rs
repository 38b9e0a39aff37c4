//! Structured output recovery from free-form model text
//!
//! Models asked for JSON routinely wrap it in markdown fences or prose.
//! This module gives every call site one consistent contract:
//! - [`extract`] — strict mode, returns an error when no schema-valid JSON
//!   object can be recovered from the text
//! - [`extract_or`] — fallback mode, returns the provided value instead
//!
//! Recovery order: strip markdown fences, try a direct parse, then scan for
//! the outermost brace-delimited object (string-aware, so braces inside JSON
//! strings do not confuse the match) and parse that.

use crate::errors::{EngineError, Result};
use serde::de::DeserializeOwned;

/// Parse a typed value out of free-form model text (strict mode).
pub fn extract<T: DeserializeOwned>(text: &str) -> Result<T> {
    let cleaned = strip_fences(text);

    if let Ok(value) = serde_json::from_str::<T>(cleaned) {
        return Ok(value);
    }

    if let Some(object) = find_json_object(cleaned) {
        return serde_json::from_str::<T>(object).map_err(|e| {
            EngineError::StructuredOutput(format!("candidate object did not match schema: {}", e))
        });
    }

    Err(EngineError::StructuredOutput(format!(
        "no JSON object found in reply: {}",
        preview(text)
    )))
}

/// Parse a typed value, returning `fallback` when recovery fails.
pub fn extract_or<T: DeserializeOwned>(text: &str, fallback: T) -> T {
    extract(text).unwrap_or(fallback)
}

/// Remove a surrounding markdown code fence, if present.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") up to the first newline
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };

    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Locate the first complete top-level JSON object in the text.
///
/// Single pass, tracking brace depth and string boundaries. Returns the
/// `{...}` slice or `None` when no balanced object is present.
fn find_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &byte) in bytes.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match byte {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if !in_string => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// First 120 chars of the offending text, for error messages.
fn preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= 120 {
        trimmed.to_string()
    } else {
        let cut = trimmed
            .char_indices()
            .take_while(|(i, _)| *i < 120)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &trimmed[..cut])
    }
}
