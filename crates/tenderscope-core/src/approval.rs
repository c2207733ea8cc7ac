//! Benchmark approval: `provisional` → `approved`.

use serde::{Deserialize, Serialize};

use crate::domain::{Machine, TransitionRejected};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkState {
    /// Statistics may be recomputed and flags reviewed.
    #[default]
    Provisional,
    /// Statistics and flags are final for the round.
    Approved,
}

impl BenchmarkState {
    pub fn is_frozen(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl std::fmt::Display for BenchmarkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provisional => write!(f, "provisional"),
            Self::Approved => write!(f, "approved"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkAction {
    /// Discard and regenerate summaries and deviation records.
    Recompute,
    Approve,
    /// Change one record's flag status.
    Review,
    /// Append price observations.
    SubmitObservations,
}

impl std::fmt::Display for BenchmarkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recompute => write!(f, "recompute"),
            Self::Approve => write!(f, "approve"),
            Self::Review => write!(f, "review"),
            Self::SubmitObservations => write!(f, "submit observations"),
        }
    }
}

/// Transition table for the approval machine. Every action is permitted
/// while provisional; only `Approve` changes the state. Nothing is permitted
/// once approved.
pub fn attempt_transition(
    current: BenchmarkState,
    action: BenchmarkAction,
) -> Result<BenchmarkState, TransitionRejected> {
    match (current, action) {
        (BenchmarkState::Provisional, BenchmarkAction::Approve) => Ok(BenchmarkState::Approved),
        (BenchmarkState::Provisional, _) => Ok(BenchmarkState::Provisional),
        (BenchmarkState::Approved, _) => Err(TransitionRejected {
            machine: Machine::Benchmark,
            state: current.to_string(),
            action: action.to_string(),
            reason: "benchmarks are approved and frozen for this round".to_string(),
        }),
    }
}
