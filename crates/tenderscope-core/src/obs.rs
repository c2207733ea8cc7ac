//! Structured observability hooks for tender evaluation events.
//!
//! This module provides:
//! - Tender-scoped tracing spans via `TenderSpan` RAII guard
//! - Emission functions for lifecycle, benchmarking and review events
//!
//! Rejections and misalignment warnings are emitted at `warn!`, everything
//! else at `info!`. Filter with `RUST_LOG=tenderscope_core=debug`.

use tracing::{info, warn};

/// RAII guard that enters a tender-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = TenderSpan::enter("T-2024-017");
/// // every event below carries tender_id = "T-2024-017"
/// ```
pub struct TenderSpan {
    _span: tracing::span::EnteredSpan,
}

impl TenderSpan {
    /// Create and enter a span tagged with the tender id.
    pub fn enter(tender_id: &str) -> Self {
        let span = tracing::info_span!("tenderscope.tender", tender_id = %tender_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: matrix locked, with the snapshot digest.
pub fn emit_matrix_locked(tender_id: &str, role: &str, digest: &str) {
    info!(event = "matrix.locked", tender_id = %tender_id, role = %role, digest = %digest);
}

/// Emit event: locked matrix forwarded to benchmarking.
pub fn emit_benchmarking_entered(tender_id: &str, observations: usize) {
    info!(
        event = "benchmark.entered",
        tender_id = %tender_id,
        observations = observations,
    );
}

/// Emit event: benchmarks (re)computed.
pub fn emit_benchmarks_computed(tender_id: &str, categories: usize, outliers: usize) {
    info!(
        event = "benchmark.computed",
        tender_id = %tender_id,
        categories = categories,
        outliers = outliers,
    );
}

/// Emit event: benchmarks approved.
pub fn emit_benchmarks_approved(tender_id: &str, pending: usize) {
    info!(event = "benchmark.approved", tender_id = %tender_id, pending = pending);
}

/// Emit event: a reviewer acted on one deviation record.
pub fn emit_flag_reviewed(tender_id: &str, record_id: &str, outcome: &str) {
    info!(
        event = "flag.reviewed",
        tender_id = %tender_id,
        record_id = %record_id,
        outcome = %outcome,
    );
}

/// Emit event: a matrix edit was refused (warning level).
pub fn emit_edit_rejected(tender_id: &str, edit: &str, reason: &dyn std::fmt::Display) {
    warn!(event = "matrix.edit_rejected", tender_id = %tender_id, edit = %edit, reason = %reason);
}

/// Emit event: a state transition was refused (warning level).
pub fn emit_transition_rejected(tender_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "transition.rejected", tender_id = %tender_id, error = %error);
}

/// Emit event: a category's weights are outside the tolerance band (warning level).
pub fn emit_weights_misaligned(tender_id: &str, category: &str, total_weight: f64) {
    warn!(
        event = "weights.misaligned",
        tender_id = %tender_id,
        category = %category,
        total_weight = total_weight,
    );
}

/// Emit event: a loaded submission names a vendor the tender does not know (warning level).
pub fn emit_submission_skipped(tender_id: &str, vendor_id: &str) {
    warn!(event = "submission.skipped", tender_id = %tender_id, vendor_id = %vendor_id);
}

/// Emit event: a criterion weight was not a finite number and was zeroed (warning level).
pub fn emit_weight_discarded(tender_id: &str, criterion_id: &str, weight: f64) {
    warn!(
        event = "criterion.weight_discarded",
        tender_id = %tender_id,
        criterion_id = %criterion_id,
        weight = %weight,
    );
}
