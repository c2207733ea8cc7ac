//! Tenderscope Core Library
//!
//! Scores vendor submissions against weighted evaluation criteria and flags
//! anomalous quoted prices against the market distribution of their category.

pub mod aggregator;
pub mod approval;
pub mod benchmark;
pub mod config;
pub mod deviation;
pub mod distribution;
pub mod domain;
pub mod lifecycle;
pub mod matrix;
pub mod metrics;
pub mod normalizer;
pub mod obs;
pub mod registry;
pub mod session;
pub mod snapshot;
pub mod source;
pub mod telemetry;

pub use domain::{
    Category, Criterion, CriterionId, Machine, PriceObservation, Provenance, RawCriterionValue,
    Result, Score, SourceError, Submission, TenderError, TransitionRejected, Vendor, VendorId,
};

pub use aggregator::{aggregate, check_alignment, CategoryScore, WeightAlignment, WEIGHT_BUDGET};
pub use approval::{BenchmarkAction, BenchmarkState};
pub use benchmark::BenchmarkReport;
pub use config::{
    Direction, EngineConfig, NormalizerConfig, ScaleRule, SeverityBands, SubFieldRule,
};
pub use deviation::{
    deviation_percent, DeviationRecord, FlagStatus, ReviewDecision, ReviewOutcome, Severity,
};
pub use distribution::{summarize, summarize_with, DistributionSummary, TUKEY_K};
pub use lifecycle::{LifecycleAction, MatrixState, Role};
pub use matrix::ScoreMatrix;
pub use normalizer::{normalize_with, Normalized, Normalizer, MAX_SCORE};
pub use registry::{SessionHandle, TenderRegistry};
pub use session::{EditOutcome, EditRejection, TenderSession, TransitionRecord};
pub use snapshot::{MatrixSnapshot, SnapshotContent, SnapshotDigest};
pub use source::{MemoryTenderSource, SourceResult, TenderData, TenderSource};

pub use metrics::METRICS;
pub use obs::TenderSpan;
pub use telemetry::init_tracing;

/// Tenderscope version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
