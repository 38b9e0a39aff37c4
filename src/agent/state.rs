//! Reasoning loop state machine
//!
//! Named states with an explicit transition function so every termination
//! condition is independently testable:
//!
//! ```text
//! Planning --PlanReady-->  Acting
//! Acting   --ToolExecuted--> Observing
//! Acting   --FinalText-->  Done
//! Acting   --Retry-->      Acting        (free text with no history yet)
//! Acting   --Replan-->     Planning      (gateway failure; replanning is the recovery)
//! Observing --Continue-->  Acting
//! Observing --Replan-->    Planning
//! Observing --Terminate--> Done
//! Done terminal
//! ```

use crate::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Generating or revising the advisory plan
    Planning,

    /// Asking the model for the next action
    Acting,

    /// An observation was just recorded; deciding what comes next
    Observing,

    /// Terminal
    Done,
}

/// Events driving transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// A plan is in place
    PlanReady,

    /// A tool was selected and executed
    ToolExecuted,

    /// The model answered in free text and the answer is final
    FinalText,

    /// The action attempt must be repeated (no observation recorded)
    Retry,

    /// Keep acting on the current plan
    Continue,

    /// Discard the plan and replan
    Replan,

    /// Stop the loop
    Terminate,
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The finish tool was invoked
    Finished,

    /// The model returned a usable free-text answer
    TextResponse,

    /// Blank text with history; answer synthesized from observations
    AutoSummary,

    /// The same action recurred beyond the repetition threshold
    LoopDetected,

    /// The iteration budget ran out
    BudgetExhausted,
}

impl LoopState {
    /// Check if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Done)
    }

    /// Attempt a transition; invalid pairs are an error
    pub fn transition(&self, event: LoopEvent) -> Result<LoopState> {
        use LoopEvent::*;
        use LoopState::*;

        let next = match (self, event) {
            (Planning, PlanReady) => Acting,

            (Acting, ToolExecuted) => Observing,
            (Acting, FinalText) => Done,
            (Acting, Retry) => Acting,
            (Acting, Replan) => Planning,
            (Acting, Terminate) => Done,

            (Observing, Continue) => Acting,
            (Observing, Replan) => Planning,
            (Observing, Terminate) => Done,

            (Done, _) => Done,

            (from, event) => {
                return Err(EngineError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }

    /// Events valid from this state
    pub fn valid_events(&self) -> Vec<LoopEvent> {
        use LoopEvent::*;
        use LoopState::*;

        match self {
            Planning => vec![PlanReady],
            Acting => vec![ToolExecuted, FinalText, Retry, Replan, Terminate],
            Observing => vec![Continue, Replan, Terminate],
            Done => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = LoopState::Planning;
        let state = state.transition(LoopEvent::PlanReady).unwrap();
        assert_eq!(state, LoopState::Acting);

        let state = state.transition(LoopEvent::ToolExecuted).unwrap();
        assert_eq!(state, LoopState::Observing);

        let state = state.transition(LoopEvent::Continue).unwrap();
        assert_eq!(state, LoopState::Acting);

        let state = state.transition(LoopEvent::Terminate).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_replan_cycle() {
        let state = LoopState::Observing.transition(LoopEvent::Replan).unwrap();
        assert_eq!(state, LoopState::Planning);
    }

    #[test]
    fn test_final_text_terminates_from_acting() {
        let state = LoopState::Acting.transition(LoopEvent::FinalText).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_retry_stays_in_acting() {
        let state = LoopState::Acting.transition(LoopEvent::Retry).unwrap();
        assert_eq!(state, LoopState::Acting);
    }

    #[test]
    fn test_done_is_absorbing() {
        for event in [
            LoopEvent::PlanReady,
            LoopEvent::ToolExecuted,
            LoopEvent::Terminate,
        ] {
            assert_eq!(LoopState::Done.transition(event).unwrap(), LoopState::Done);
        }
    }

    #[test]
    fn test_invalid_transition() {
        assert!(LoopState::Planning.transition(LoopEvent::Continue).is_err());
        assert!(LoopState::Observing.transition(LoopEvent::PlanReady).is_err());
    }

    #[test]
    fn test_determinism() {
        let a = LoopState::Acting.transition(LoopEvent::ToolExecuted).unwrap();
        let b = LoopState::Acting.transition(LoopEvent::ToolExecuted).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_valid_events_cover_transitions() {
        for state in [LoopState::Planning, LoopState::Acting, LoopState::Observing] {
            for event in state.valid_events() {
                assert!(state.transition(event).is_ok());
            }
        }
        assert!(LoopState::Done.valid_events().is_empty());
    }
}
