//! Domain-level error taxonomy for tenderscope.

/// Which one-way state machine refused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Machine {
    Lifecycle,
    Benchmark,
}

impl std::fmt::Display for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lifecycle => write!(f, "lifecycle"),
            Self::Benchmark => write!(f, "benchmark"),
        }
    }
}

/// An action was not permitted in the current state. The state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{machine}: {action} not permitted in state {state}: {reason}")]
pub struct TransitionRejected {
    pub machine: Machine,
    pub state: String,
    pub action: String,
    pub reason: String,
}

/// Errors raised by upstream collaborators (ingestion, market data).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("tender not found in source: {0}")]
    TenderNotFound(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Tenderscope domain errors.
#[derive(Debug, thiserror::Error)]
pub enum TenderError {
    #[error(transparent)]
    Transition(#[from] TransitionRejected),

    #[error("unknown criterion: {0}")]
    UnknownCriterion(String),

    #[error("unknown vendor: {0}")]
    UnknownVendor(String),

    #[error("deviation record not found: {0}")]
    RecordNotFound(String),

    #[error("tender not registered: {0}")]
    TenderNotFound(String),

    #[error("benchmarking has not started for tender {0}")]
    BenchmarkNotStarted(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("source timed out after {timeout_ms}ms for tender {tender_id}")]
    SourceTimeout { tender_id: String, timeout_ms: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tenderscope domain operations.
pub type Result<T> = std::result::Result<T, TenderError>;
