//! Observations and loop heuristics
//!
//! One observation per loop iteration: the tool, its input, and its output.
//! The list is append-only for the duration of one run and discarded when
//! the run ends. Loop detection, the replan trigger, and the degraded
//! summaries are all pure functions over this list so they can be tested
//! without a model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output characters kept when formatting history for the model
const HISTORY_OUTPUT_LIMIT: usize = 500;

/// The recorded outcome of one action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// 1-based, strictly increasing step number
    pub step: u32,

    /// Tool that was executed
    pub tool: String,

    /// Arguments the model selected
    pub input: Value,

    /// Structured result the tool returned
    pub output: Value,
}

impl Observation {
    /// Canonical signature of the action: tool name plus sorted top-level
    /// argument pairs. Two calls with the same tool and arguments collide
    /// regardless of argument order.
    pub fn signature(&self) -> String {
        match self.input.as_object() {
            Some(map) => {
                let mut pairs: Vec<String> =
                    map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                pairs.sort();
                format!("{}:{}", self.tool, pairs.join(","))
            }
            None => format!("{}:{}", self.tool, self.input),
        }
    }

    /// Whether the tool reported an error
    pub fn is_error(&self) -> bool {
        self.output
            .get("error")
            .map(|e| !e.is_null())
            .unwrap_or(false)
    }

    /// The result count, when the tool reported one
    pub fn result_count(&self) -> Option<i64> {
        self.output.get("count").and_then(Value::as_i64)
    }
}

/// Loop detection: the most recent action's signature has occurred at
/// least `max_repeats` times among all observations.
pub fn detect_loop(observations: &[Observation], max_repeats: usize) -> bool {
    if observations.len() < max_repeats {
        return false;
    }

    let last = match observations.last() {
        Some(obs) => obs.signature(),
        None => return false,
    };

    observations
        .iter()
        .filter(|obs| obs.signature() == last)
        .count()
        >= max_repeats
}

/// Replan when the last observation signals failure or emptiness
pub fn should_replan(observations: &[Observation]) -> bool {
    let Some(last) = observations.last() else {
        return false;
    };

    last.is_error() || last.result_count() == Some(0)
}

/// Deterministic partial summary used on loop detection and budget
/// exhaustion: the non-error observations with nonzero result counts.
pub fn partial_summary(query: &str, observations: &[Observation]) -> String {
    let mut summary = format!("Partial search results for: {}\n\n", query);

    let useful: Vec<String> = observations
        .iter()
        .filter(|obs| !obs.is_error())
        .filter_map(|obs| {
            obs.result_count()
                .filter(|count| *count > 0)
                .map(|count| format!("- {}: {} results", obs.tool, count))
        })
        .collect();

    if useful.is_empty() {
        summary.push_str("No relevant results were found.");
    } else {
        summary.push_str("Results found:\n");
        summary.push_str(&useful.join("\n"));
    }

    summary
}

/// Structured summary built when the model ends with blank text but the
/// run gathered usable observations.
pub fn summary_from_observations(query: &str, observations: &[Observation]) -> String {
    let mut parts = vec![format!("Search results for: {}\n", query)];

    for obs in observations {
        if obs.is_error() {
            continue;
        }
        let Some(count) = obs.result_count().filter(|c| *c > 0) else {
            continue;
        };

        match obs.tool.as_str() {
            "list_documents" => {
                parts.push(format!("\nDocuments found: {}", count));
                if let Some(docs) = obs.output.get("documents").and_then(Value::as_array) {
                    for doc in docs.iter().take(3) {
                        if let Some(name) = doc.get("filename").and_then(Value::as_str) {
                            parts.push(format!("  - {}", name));
                        }
                    }
                }
            }
            "sql_query" => {
                parts.push(format!("\nDatabase records found: {}", count));
            }
            other => {
                parts.push(format!("\n{}: {} results", other, count));
            }
        }
    }

    if parts.len() == 1 {
        parts.push("\nNo relevant results were found.".to_string());
    }

    parts.join("\n")
}

/// Format the observation history for the action prompt, truncating long
/// outputs
pub fn format_history(observations: &[Observation]) -> String {
    if observations.is_empty() {
        return "You have not taken any action yet.".to_string();
    }

    let mut formatted = String::from("Action history:\n");
    for obs in observations {
        let mut output = obs.output.to_string();
        if output.len() > HISTORY_OUTPUT_LIMIT {
            let cut = output
                .char_indices()
                .take_while(|(i, _)| *i < HISTORY_OUTPUT_LIMIT)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            output.truncate(cut);
            output.push_str("...");
        }

        formatted.push_str(&format!(
            "\nStep {}:\n- Tool: {}\n- Input: {}\n- Result: {}\n",
            obs.step, obs.tool, obs.input, output
        ));
    }

    formatted
}
