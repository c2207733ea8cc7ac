//! Per-tender evaluation session.
//!
//! A [`TenderSession`] owns everything scoped to one tender round: the
//! scoring matrix, the raw submissions it was derived from, both state
//! machines, the locked snapshot, the benchmark report and an audit trail of
//! transitions. Every engine operation is a synchronous method here; the
//! [`crate::registry`] adds per-tender serialization on top.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::{CategoryScore, WeightAlignment, WEIGHT_BUDGET};
use crate::approval::{self, BenchmarkAction, BenchmarkState};
use crate::benchmark::BenchmarkReport;
use crate::config::EngineConfig;
use crate::deviation::{FlagStatus, ReviewDecision, ReviewOutcome};
use crate::domain::{
    Category, Criterion, CriterionId, Machine, PriceObservation, Result, Score, Submission,
    TenderError, TransitionRejected, Vendor, VendorId,
};
use crate::lifecycle::{self, LifecycleAction, MatrixState, Role};
use crate::matrix::ScoreMatrix;
use crate::metrics::METRICS;
use crate::normalizer::{Normalizer, MAX_SCORE};
use crate::obs;
use crate::snapshot::MatrixSnapshot;

/// Result of a weight or score mutation. Refusals are signals, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    Applied,
    Rejected { reason: EditRejection },
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditRejection {
    MatrixLocked,
    WeightOutOfRange { weight: f64 },
    ScoreOutOfRange { value: f64 },
}

impl std::fmt::Display for EditRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatrixLocked => write!(f, "matrix is locked"),
            Self::WeightOutOfRange { weight } => {
                write!(f, "weight {weight} outside 0..={WEIGHT_BUDGET}")
            }
            Self::ScoreOutOfRange { value } => write!(f, "score {value} outside 0..={MAX_SCORE}"),
        }
    }
}

/// Audit entry for one state-machine action, accepted or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub machine: Machine,
    pub action: String,
    pub from: String,
    /// Resulting state; `None` when rejected.
    pub to: Option<String>,
    pub rejection: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct BenchmarkBook {
    state: BenchmarkState,
    observations: Vec<PriceObservation>,
    report: BenchmarkReport,
}

#[derive(Debug, Clone)]
pub struct TenderSession {
    tender_id: String,
    config: EngineConfig,
    normalizer: Normalizer,
    matrix: ScoreMatrix,
    submissions: BTreeMap<VendorId, Submission>,
    lifecycle: MatrixState,
    snapshot: Option<MatrixSnapshot>,
    benchmark: Option<BenchmarkBook>,
    history: Vec<TransitionRecord>,
}

impl TenderSession {
    pub fn new(
        tender_id: impl Into<String>,
        criteria: Vec<Criterion>,
        vendors: Vec<Vendor>,
        config: EngineConfig,
    ) -> Self {
        let tender_id = tender_id.into();
        // Only finite weights enter the matrix.
        let criteria = criteria
            .into_iter()
            .map(|mut criterion| {
                if !criterion.weight.is_finite() {
                    obs::emit_weight_discarded(&tender_id, criterion.id.as_str(), criterion.weight);
                    criterion.weight = 0.0;
                }
                criterion
            })
            .collect();
        Self {
            tender_id,
            normalizer: Normalizer::new(config.normalizer.clone()),
            config,
            matrix: ScoreMatrix::new(criteria, vendors),
            submissions: BTreeMap::new(),
            lifecycle: MatrixState::Editable,
            snapshot: None,
            benchmark: None,
            history: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn tender_id(&self) -> &str {
        &self.tender_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn matrix(&self) -> &ScoreMatrix {
        &self.matrix
    }

    pub fn lifecycle_state(&self) -> MatrixState {
        self.lifecycle
    }

    /// `None` until the matrix has been forwarded to benchmarking.
    pub fn benchmark_state(&self) -> Option<BenchmarkState> {
        self.benchmark.as_ref().map(|b| b.state)
    }

    pub fn snapshot(&self) -> Option<&MatrixSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn report(&self) -> Option<&BenchmarkReport> {
        self.benchmark.as_ref().map(|b| &b.report)
    }

    pub fn observations(&self) -> &[PriceObservation] {
        self.benchmark
            .as_ref()
            .map(|b| b.observations.as_slice())
            .unwrap_or(&[])
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    pub fn category_score(&self, vendor: &VendorId, category: Category) -> f64 {
        self.matrix.category_score(vendor, category)
    }

    pub fn ranking(&self, category: Category) -> Vec<CategoryScore> {
        self.matrix.ranking(category)
    }

    pub fn alignment(&self, category: Category) -> WeightAlignment {
        self.matrix.alignment(category, self.config.weight_tolerance)
    }

    /// Alignment of every category that has criteria.
    pub fn alignments(&self) -> Vec<WeightAlignment> {
        self.matrix
            .active_categories()
            .into_iter()
            .map(|c| self.alignment(c))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Matrix edits (refused once locked)
    // -----------------------------------------------------------------------

    /// Normalize every criterion for one vendor's raw submission.
    ///
    /// Human-overridden scores are kept. The submission is retained so an
    /// override can later be reset to its machine score.
    pub fn ingest(&mut self, submission: Submission) -> Result<EditOutcome> {
        self.matrix.vendor(&submission.vendor_id)?;
        if !self.lifecycle.accepts_edits() {
            return Ok(self.refuse_edit("ingest", EditRejection::MatrixLocked));
        }

        let mut stored = 0u64;
        for criterion in self.matrix.criteria().to_vec() {
            let normalized = self
                .normalizer
                .normalize(&criterion.name, submission.value(&criterion.name));
            let score = Score::machine(
                criterion.id.clone(),
                submission.vendor_id.clone(),
                normalized.value,
                normalized.confidence,
            );
            if self.matrix.put_machine(score) {
                stored += 1;
            }
        }
        METRICS.add_scores_normalized(stored);
        tracing::debug!(
            tender_id = %self.tender_id,
            vendor_id = %submission.vendor_id,
            stored,
            "submission normalized"
        );

        self.submissions
            .insert(submission.vendor_id.clone(), submission);
        Ok(EditOutcome::Applied)
    }

    pub fn set_weight(&mut self, criterion_id: &CriterionId, weight: f64) -> Result<EditOutcome> {
        let category = self.matrix.criterion(criterion_id)?.category;
        if !self.lifecycle.accepts_edits() {
            return Ok(self.refuse_edit("set_weight", EditRejection::MatrixLocked));
        }
        if !(0.0..=WEIGHT_BUDGET).contains(&weight) {
            return Ok(self.refuse_edit("set_weight", EditRejection::WeightOutOfRange { weight }));
        }

        self.matrix.set_weight(criterion_id, weight)?;
        let alignment = self.alignment(category);
        if !alignment.aligned {
            obs::emit_weights_misaligned(
                &self.tender_id,
                &category.to_string(),
                alignment.total_weight,
            );
        }
        Ok(EditOutcome::Applied)
    }

    /// Replace a score with a human judgement (0–10). The slot keeps human
    /// provenance until [`Self::reset_override`].
    pub fn override_score(
        &mut self,
        criterion_id: &CriterionId,
        vendor_id: &VendorId,
        value: f64,
    ) -> Result<EditOutcome> {
        self.matrix.criterion(criterion_id)?;
        self.matrix.vendor(vendor_id)?;
        if !self.lifecycle.accepts_edits() {
            return Ok(self.refuse_edit("override_score", EditRejection::MatrixLocked));
        }
        if !(0.0..=MAX_SCORE).contains(&value) {
            return Ok(self.refuse_edit("override_score", EditRejection::ScoreOutOfRange { value }));
        }

        self.matrix
            .put(Score::human(criterion_id.clone(), vendor_id.clone(), value));
        Ok(EditOutcome::Applied)
    }

    /// Drop a human override and restore the machine score derived from the
    /// vendor's last ingested submission (0 if none was ingested).
    pub fn reset_override(
        &mut self,
        criterion_id: &CriterionId,
        vendor_id: &VendorId,
    ) -> Result<EditOutcome> {
        let name = self.matrix.criterion(criterion_id)?.name.clone();
        self.matrix.vendor(vendor_id)?;
        if !self.lifecycle.accepts_edits() {
            return Ok(self.refuse_edit("reset_override", EditRejection::MatrixLocked));
        }

        let raw = self.submissions.get(vendor_id).and_then(|s| s.value(&name));
        let normalized = self.normalizer.normalize(&name, raw);
        self.matrix.put(Score::machine(
            criterion_id.clone(),
            vendor_id.clone(),
            normalized.value,
            normalized.confidence,
        ));
        Ok(EditOutcome::Applied)
    }

    fn refuse_edit(&self, edit: &str, reason: EditRejection) -> EditOutcome {
        METRICS.inc_edits_rejected();
        obs::emit_edit_rejected(&self.tender_id, edit, &reason);
        EditOutcome::Rejected { reason }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Lock the matrix (chair only) and capture its snapshot.
    pub fn lock(&mut self, role: Role) -> Result<&MatrixSnapshot> {
        let action = LifecycleAction::Lock { role };
        let from = self.lifecycle;
        let next = match lifecycle::attempt_transition(from, action) {
            Ok(next) => next,
            Err(e) => return Err(self.reject(e)),
        };

        for alignment in self.alignments().into_iter().filter(|a| !a.aligned) {
            obs::emit_weights_misaligned(
                &self.tender_id,
                &alignment.category.to_string(),
                alignment.total_weight,
            );
        }

        let now = Utc::now();
        let snapshot = MatrixSnapshot::capture(
            &self.tender_id,
            &self.matrix,
            self.config.weight_tolerance,
            role,
            now,
        )?;
        self.lifecycle = next;
        self.record(Machine::Lifecycle, &action.to_string(), &from.to_string(), &next.to_string());
        obs::emit_matrix_locked(&self.tender_id, &role.to_string(), snapshot.digest.as_str());
        Ok(self.snapshot.insert(snapshot))
    }

    /// Forward the locked matrix to benchmarking with the round's initial
    /// price observations. Opens the benchmark book as provisional and runs
    /// the first computation.
    pub fn enter_benchmarking(
        &mut self,
        observations: Vec<PriceObservation>,
    ) -> Result<&BenchmarkReport> {
        let action = LifecycleAction::EnterBenchmarking;
        let from = self.lifecycle;
        let next = match lifecycle::attempt_transition(from, action) {
            Ok(next) => next,
            Err(e) => return Err(self.reject(e)),
        };
        if self.benchmark.is_some() {
            let e = TransitionRejected {
                machine: Machine::Lifecycle,
                state: from.to_string(),
                action: action.to_string(),
                reason: "tender is already in benchmarking".to_string(),
            };
            return Err(self.reject(e));
        }

        obs::emit_benchmarking_entered(&self.tender_id, observations.len());
        let report = self.compute_report(&observations);
        self.record(Machine::Lifecycle, &action.to_string(), &from.to_string(), &next.to_string());
        let book = self.benchmark.insert(BenchmarkBook {
            state: BenchmarkState::Provisional,
            observations,
            report,
        });
        Ok(&book.report)
    }

    // -----------------------------------------------------------------------
    // Benchmarking
    // -----------------------------------------------------------------------

    /// Append observations for the round. Existing observations are never
    /// modified; call [`Self::recompute`] to fold new ones into the report.
    pub fn submit_observations(&mut self, observations: Vec<PriceObservation>) -> Result<()> {
        self.guard_benchmark(BenchmarkAction::SubmitObservations)?;
        let book = self.book_mut()?;
        book.observations.extend(observations);
        Ok(())
    }

    /// Discard all summaries and deviation records and regenerate them from
    /// the current observations. Every flag returns to pending.
    pub fn recompute(&mut self) -> Result<&BenchmarkReport> {
        let (from, next) = self.guard_benchmark(BenchmarkAction::Recompute)?;
        let observations = self.book_mut()?.observations.clone();
        let report = self.compute_report(&observations);
        self.record(
            Machine::Benchmark,
            &BenchmarkAction::Recompute.to_string(),
            &from.to_string(),
            &next.to_string(),
        );
        let book = self.book_mut()?;
        book.report = report;
        Ok(&book.report)
    }

    /// Apply a reviewer decision to exactly one deviation record.
    pub fn review_flag(&mut self, record_id: &str, decision: ReviewDecision) -> Result<ReviewOutcome> {
        let (from, next) = self.guard_benchmark(BenchmarkAction::Review)?;
        let record = self
            .book_mut()?
            .report
            .record_mut(record_id)
            .ok_or_else(|| TenderError::RecordNotFound(record_id.to_string()))?;
        let outcome = record.apply_review(decision);

        let label = match outcome {
            ReviewOutcome::Applied(status) => status.to_string(),
            ReviewOutcome::AlreadyResolved(status) => format!("already {status}"),
            ReviewOutcome::NotFlagged => "not flagged".to_string(),
        };
        obs::emit_flag_reviewed(&self.tender_id, record_id, &label);
        if matches!(outcome, ReviewOutcome::Applied(_)) {
            self.record(
                Machine::Benchmark,
                &format!("review {record_id}"),
                &from.to_string(),
                &next.to_string(),
            );
        }
        Ok(outcome)
    }

    /// Freeze summaries and flags for the round.
    pub fn approve_benchmarks(&mut self) -> Result<BenchmarkState> {
        let (from, next) = self.guard_benchmark(BenchmarkAction::Approve)?;
        let book = self.book_mut()?;
        book.state = next;
        let pending = book.report.count_with_status(FlagStatus::Pending);
        self.record(
            Machine::Benchmark,
            &BenchmarkAction::Approve.to_string(),
            &from.to_string(),
            &next.to_string(),
        );
        obs::emit_benchmarks_approved(&self.tender_id, pending);
        METRICS.flush();
        Ok(next)
    }

    fn compute_report(&self, observations: &[PriceObservation]) -> BenchmarkReport {
        let report = BenchmarkReport::compute(observations, &self.config);
        let outliers = report.outliers().count();
        METRICS.add_outliers_flagged(outliers as u64);
        obs::emit_benchmarks_computed(&self.tender_id, report.summaries.len(), outliers);
        report
    }

    fn book_mut(&mut self) -> Result<&mut BenchmarkBook> {
        self.benchmark
            .as_mut()
            .ok_or_else(|| TenderError::BenchmarkNotStarted(self.tender_id.clone()))
    }

    /// Run the approval machine for `action`, returning `(from, next)`.
    fn guard_benchmark(
        &mut self,
        action: BenchmarkAction,
    ) -> Result<(BenchmarkState, BenchmarkState)> {
        let from = self.book_mut()?.state;
        match approval::attempt_transition(from, action) {
            Ok(next) => Ok((from, next)),
            Err(e) => Err(self.reject(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Audit trail
    // -----------------------------------------------------------------------

    fn record(&mut self, machine: Machine, action: &str, from: &str, to: &str) {
        self.history.push(TransitionRecord {
            machine,
            action: action.to_string(),
            from: from.to_string(),
            to: Some(to.to_string()),
            rejection: None,
            at: Utc::now(),
        });
    }

    fn reject(&mut self, e: TransitionRejected) -> TenderError {
        METRICS.inc_transitions_rejected();
        obs::emit_transition_rejected(&self.tender_id, &e);
        self.history.push(TransitionRecord {
            machine: e.machine,
            action: e.action.clone(),
            from: e.state.clone(),
            to: None,
            rejection: Some(e.reason.clone()),
            at: Utc::now(),
        });
        e.into()
    }
}
