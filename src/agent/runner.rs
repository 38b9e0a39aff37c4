//! The search agent: a bounded plan/act/observe/decide loop
//!
//! The agent is a generic shell around an immutable tool set. Each run is
//! independent: observations live only for the duration of one `run` call,
//! and nothing is shared between concurrent runs. No tool error and no
//! gateway error ever escapes the loop; every run produces an answer, even
//! if it is a degraded partial summary.

use crate::agent::observation::{
    detect_loop, format_history, partial_summary, should_replan, summary_from_observations,
    Observation,
};
use crate::agent::prompts::{PLAN_SYSTEM_PROMPT, REACT_SYSTEM_PROMPT};
use crate::agent::state::{LoopEvent, LoopState, StopReason};
use crate::gateway::{GatewayReply, GenerateOptions, ModelGateway};
use crate::tools::{ToolSet, FINISH_TOOL};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Agent loop configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Iteration budget per run
    pub max_iterations: usize,

    /// Identical-action repetitions before the loop is declared stuck
    pub max_repeats: usize,

    /// Enable progress logging
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_repeats: 3,
            verbose: false,
        }
    }
}

/// Metadata describing how a run ended
#[derive(Debug, Clone)]
pub struct RunMetadata {
    /// Run-scoped identifier
    pub run_id: Uuid,

    /// Last advisory plan, if one was generated
    pub plan: Option<String>,

    /// Full observation history of the run
    pub observations: Vec<Observation>,

    /// Gateway action attempts consumed
    pub iterations: usize,

    /// Why the loop stopped
    pub stop: StopReason,

    /// Sources reported by the finish tool
    pub sources: Vec<String>,

    /// Confidence reported by the finish tool
    pub confidence: Option<String>,
}

/// Result of one agent run
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Final answer text (possibly a degraded partial summary)
    pub answer: String,

    /// Run metadata
    pub metadata: RunMetadata,
}

/// Multi-source search agent driving the reasoning loop
pub struct SearchAgent {
    gateway: Arc<dyn ModelGateway>,
    tools: ToolSet,
    plan_prompt: String,
    action_prompt: String,
    config: AgentConfig,
}

impl SearchAgent {
    /// Create an agent over a gateway and an immutable tool set
    pub fn new(gateway: Arc<dyn ModelGateway>, tools: ToolSet) -> Self {
        Self {
            gateway,
            tools,
            plan_prompt: PLAN_SYSTEM_PROMPT.to_string(),
            action_prompt: REACT_SYSTEM_PROMPT.to_string(),
            config: AgentConfig::default(),
        }
    }

    /// Substitute domain-specific system prompts
    pub fn with_prompts(mut self, plan: impl Into<String>, action: impl Into<String>) -> Self {
        self.plan_prompt = plan.into();
        self.action_prompt = action.into();
        self
    }

    /// Override loop configuration
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the loop for one query. Never fails: degraded outcomes carry a
    /// partial summary and an explicit stop reason.
    pub async fn run(&self, query: &str) -> AgentOutcome {
        let run_id = Uuid::new_v4();
        let mut observations: Vec<Observation> = Vec::new();
        let mut plan: Option<String> = None;
        let mut state = LoopState::Planning;
        let mut iterations = 0usize;

        loop {
            match state {
                LoopState::Planning => {
                    let generated = self.generate_plan(query, &observations).await;
                    if self.config.verbose {
                        eprintln!("[AGENT] plan:\n{}", generated);
                    }
                    plan = Some(generated);
                    state = advance(state, LoopEvent::PlanReady);
                }

                LoopState::Acting => {
                    if iterations >= self.config.max_iterations {
                        let answer = format!(
                            "{}\n\n(Search ended after reaching the limit of {} iterations)",
                            partial_summary(query, &observations),
                            self.config.max_iterations
                        );
                        return self.outcome(
                            run_id,
                            answer,
                            plan,
                            observations,
                            iterations,
                            StopReason::BudgetExhausted,
                        );
                    }
                    iterations += 1;

                    let prompt = self.build_action_prompt(
                        query,
                        plan.as_deref().unwrap_or(""),
                        &observations,
                    );

                    let reply = match self
                        .gateway
                        .generate_with_tools(
                            &prompt,
                            self.tools.definitions(),
                            &GenerateOptions::default(),
                        )
                        .await
                    {
                        Ok(reply) => reply,
                        Err(e) => {
                            // No automatic retry of the call itself;
                            // replanning is the sole recovery mechanism
                            if self.config.verbose {
                                eprintln!("[AGENT] gateway error, replanning: {}", e);
                            }
                            plan = None;
                            state = advance(state, LoopEvent::Replan);
                            continue;
                        }
                    };

                    match reply {
                        GatewayReply::Text(text) => {
                            let trimmed = text.trim();
                            if observations.is_empty() {
                                // Nothing observed yet: not a final answer
                                state = advance(state, LoopEvent::Retry);
                            } else if trimmed.is_empty() {
                                let answer = summary_from_observations(query, &observations);
                                return self.outcome(
                                    run_id,
                                    answer,
                                    plan,
                                    observations,
                                    iterations,
                                    StopReason::AutoSummary,
                                );
                            } else {
                                return self.outcome(
                                    run_id,
                                    trimmed.to_string(),
                                    plan,
                                    observations,
                                    iterations,
                                    StopReason::TextResponse,
                                );
                            }
                        }
                        GatewayReply::ToolCall { name, arguments } => {
                            if self.config.verbose {
                                eprintln!("[AGENT] step {}: {} {}", iterations, name, arguments);
                            }
                            let output = self.tools.execute(&name, arguments.clone()).await;
                            observations.push(Observation {
                                step: (observations.len() + 1) as u32,
                                tool: name,
                                input: arguments,
                                output,
                            });
                            state = advance(state, LoopEvent::ToolExecuted);
                        }
                    }
                }

                LoopState::Observing => {
                    // Termination checks, in contract order
                    if let Some(last) = observations.last() {
                        if last.tool == FINISH_TOOL && !last.is_error() {
                            let (answer, sources, confidence) = unpack_finish(&last.output);
                            let mut outcome = self.outcome(
                                run_id,
                                answer,
                                plan,
                                observations,
                                iterations,
                                StopReason::Finished,
                            );
                            outcome.metadata.sources = sources;
                            outcome.metadata.confidence = confidence;
                            return outcome;
                        }
                    }

                    if detect_loop(&observations, self.config.max_repeats) {
                        let answer = format!(
                            "{}\n\n(Search ended after detecting a repeated action)",
                            partial_summary(query, &observations)
                        );
                        return self.outcome(
                            run_id,
                            answer,
                            plan,
                            observations,
                            iterations,
                            StopReason::LoopDetected,
                        );
                    }

                    if should_replan(&observations) {
                        plan = None;
                        state = advance(state, LoopEvent::Replan);
                    } else {
                        state = advance(state, LoopEvent::Continue);
                    }
                }

                // Reached only through a transition bug; degrade to the
                // partial summary instead of spinning
                LoopState::Done => {
                    let answer = partial_summary(query, &observations);
                    return self.outcome(
                        run_id,
                        answer,
                        plan,
                        observations,
                        iterations,
                        StopReason::BudgetExhausted,
                    );
                }
            }
        }
    }

    /// Generate an advisory plan. A gateway failure degrades to a fixed
    /// two-step plan rather than aborting the run.
    async fn generate_plan(&self, query: &str, observations: &[Observation]) -> String {
        let prompt = format!(
            "{}\n\nUser query: {}\n\n{}\n\nProduce a plan of 2-4 concrete steps. \
             Do NOT execute any action, only plan.",
            self.plan_prompt,
            query,
            format_history(observations)
        );

        match self
            .gateway
            .generate(&prompt, &GenerateOptions::default())
            .await
        {
            Ok(plan) if !plan.trim().is_empty() => plan.trim().to_string(),
            _ => "1. Search the available sources for the query terms\n\
                  2. Consolidate findings and finish"
                .to_string(),
        }
    }

    fn build_action_prompt(&self, query: &str, plan: &str, observations: &[Observation]) -> String {
        format!(
            "{}\n\nUser query: {}\n\nCurrent plan:\n{}\n\n{}\n\n\
             Execute the next step of the plan using one tool.\n\
             If you already have enough information, use \"finish\" to produce the final answer.",
            self.action_prompt,
            query,
            plan,
            format_history(observations)
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn outcome(
        &self,
        run_id: Uuid,
        answer: String,
        plan: Option<String>,
        observations: Vec<Observation>,
        iterations: usize,
        stop: StopReason,
    ) -> AgentOutcome {
        AgentOutcome {
            answer,
            metadata: RunMetadata {
                run_id,
                plan,
                observations,
                iterations,
                stop,
                sources: Vec::new(),
                confidence: None,
            },
        }
    }
}

/// Advance the state machine; a transition bug degrades to termination
fn advance(state: LoopState, event: LoopEvent) -> LoopState {
    state.transition(event).unwrap_or(LoopState::Done)
}

/// Pull the structured summary out of a finish-tool result
fn unpack_finish(output: &Value) -> (String, Vec<String>, Option<String>) {
    let answer = output
        .get("summary")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .unwrap_or_else(|| output.to_string());

    let sources = output
        .get("sources")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    let confidence = output
        .get("confidence")
        .and_then(Value::as_str)
        .map(|s| s.to_string());

    (answer, sources, confidence)
}
