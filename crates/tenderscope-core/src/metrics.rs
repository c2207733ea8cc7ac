//! Global atomic counters for tenderscope observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. after a benchmark approval).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    scores_normalized: AtomicU64,
    edits_rejected: AtomicU64,
    outliers_flagged: AtomicU64,
    transitions_rejected: AtomicU64,
    submissions_skipped: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            scores_normalized: AtomicU64::new(0),
            edits_rejected: AtomicU64::new(0),
            outliers_flagged: AtomicU64::new(0),
            transitions_rejected: AtomicU64::new(0),
            submissions_skipped: AtomicU64::new(0),
        }
    }

    /// Add to the scores-normalized counter.
    pub fn add_scores_normalized(&self, n: u64) {
        self.scores_normalized.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "scores_normalized", n, "counter incremented");
    }

    pub fn inc_edits_rejected(&self) {
        self.edits_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "edits_rejected", "counter incremented");
    }

    /// Add to the outliers-flagged counter.
    pub fn add_outliers_flagged(&self, n: u64) {
        self.outliers_flagged.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "outliers_flagged", n, "counter incremented");
    }

    pub fn inc_transitions_rejected(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "transitions_rejected", "counter incremented");
    }

    pub fn inc_submissions_skipped(&self) {
        self.submissions_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "submissions_skipped", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (benchmark approval, CLI exit)
    /// rather than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            scores_normalized = self.scores_normalized(),
            edits_rejected = self.edits_rejected(),
            outliers_flagged = self.outliers_flagged(),
            transitions_rejected = self.transitions_rejected(),
            submissions_skipped = self.submissions_skipped(),
        );
    }

    pub fn scores_normalized(&self) -> u64 {
        self.scores_normalized.load(Ordering::Relaxed)
    }

    pub fn edits_rejected(&self) -> u64 {
        self.edits_rejected.load(Ordering::Relaxed)
    }

    pub fn outliers_flagged(&self) -> u64 {
        self.outliers_flagged.load(Ordering::Relaxed)
    }

    pub fn transitions_rejected(&self) -> u64 {
        self.transitions_rejected.load(Ordering::Relaxed)
    }

    pub fn submissions_skipped(&self) -> u64 {
        self.submissions_skipped.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.scores_normalized.store(0, Ordering::Relaxed);
        self.edits_rejected.store(0, Ordering::Relaxed);
        self.outliers_flagged.store(0, Ordering::Relaxed);
        self.transitions_rejected.store(0, Ordering::Relaxed);
        self.submissions_skipped.store(0, Ordering::Relaxed);
    }
}
