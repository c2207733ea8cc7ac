//! Evaluation lifecycle: `editable` → `locked`, then forward to benchmarking.

use serde::{Deserialize, Serialize};

use crate::domain::{Machine, TransitionRejected};

/// Caller role, as supplied by the permission collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Evaluation committee chair; the only role that may lock.
    Chair,
    Evaluator,
    Observer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chair => write!(f, "chair"),
            Self::Evaluator => write!(f, "evaluator"),
            Self::Observer => write!(f, "observer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chair" => Ok(Self::Chair),
            "evaluator" => Ok(Self::Evaluator),
            "observer" => Ok(Self::Observer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Lock state of a tender's scoring matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixState {
    /// Weights and scores may change.
    #[default]
    Editable,
    /// Frozen for the round.
    Locked,
}

impl MatrixState {
    pub fn accepts_edits(self) -> bool {
        matches!(self, Self::Editable)
    }
}

impl std::fmt::Display for MatrixState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editable => write!(f, "editable"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleAction {
    Lock { role: Role },
    /// Hand the locked matrix over to benchmarking.
    EnterBenchmarking,
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lock { role } => write!(f, "lock by {role}"),
            Self::EnterBenchmarking => write!(f, "enter benchmarking"),
        }
    }
}

/// Transition table for the lifecycle machine.
///
/// | State    | Lock (chair) | Lock (other) | EnterBenchmarking |
/// |----------|--------------|--------------|-------------------|
/// | editable | locked       | rejected     | rejected          |
/// | locked   | rejected     | rejected     | locked            |
pub fn attempt_transition(
    current: MatrixState,
    action: LifecycleAction,
) -> Result<MatrixState, TransitionRejected> {
    let reject = |reason: &str| TransitionRejected {
        machine: Machine::Lifecycle,
        state: current.to_string(),
        action: action.to_string(),
        reason: reason.to_string(),
    };

    match (current, action) {
        (MatrixState::Editable, LifecycleAction::Lock { role: Role::Chair }) => {
            Ok(MatrixState::Locked)
        }
        (MatrixState::Locked, LifecycleAction::Lock { .. }) => {
            Err(reject("matrix is already locked"))
        }
        (_, LifecycleAction::Lock { .. }) => Err(reject("only the chair may lock the matrix")),
        (MatrixState::Locked, LifecycleAction::EnterBenchmarking) => Ok(MatrixState::Locked),
        (MatrixState::Editable, LifecycleAction::EnterBenchmarking) => {
            Err(reject("matrix must be locked before benchmarking"))
        }
    }
}
