//! Deviation flagger.
//!
//! Every price observation becomes a [`DeviationRecord`] carrying its
//! percentage distance from the category median. Whether a record is flagged
//! for review is decided by the Tukey test of its category summary, not by
//! the deviation alone.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::SeverityBands;
use crate::distribution::DistributionSummary;
use crate::domain::PriceObservation;

/// `(quoted − median) / median × 100`. Zero when the median is zero or the
/// result is not finite.
pub fn deviation_percent(quoted: f64, median: f64) -> f64 {
    if median == 0.0 {
        return 0.0;
    }
    let pct = (quoted - median) / median * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

/// Presentation band for a deviation's magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Elevated,
    Critical,
}

impl Severity {
    pub fn classify(deviation_pct: f64, bands: &SeverityBands) -> Self {
        let magnitude = deviation_pct.abs();
        if magnitude >= bands.critical_pct {
            Self::Critical
        } else if magnitude >= bands.elevated_pct {
            Self::Elevated
        } else {
            Self::Normal
        }
    }
}

/// Review state of a flagged record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagStatus {
    /// Awaiting a reviewer.
    Pending,
    /// Reviewer confirmed the anomaly is acceptable.
    Accepted,
    /// Reviewer disputes the flag.
    Rejected,
}

impl FlagStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl std::fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A reviewer's decision on one flagged record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Accept,
    Reject,
}

/// What a review did to its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Applied(FlagStatus),
    /// The record was already accepted or rejected; nothing changed.
    AlreadyResolved(FlagStatus),
    /// The record is not an outlier; there is nothing to review.
    NotFlagged,
}

/// One observation evaluated against its category's market median.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationRecord {
    /// `<category>:<vendor>#<n>`, stable across recomputes of the same input.
    pub record_id: String,
    pub item: String,
    pub vendor: String,
    pub quoted_price: f64,
    pub market_median: f64,
    pub deviation_percent: f64,
    pub severity: Severity,
    pub is_outlier: bool,
    /// `Some(Pending)` for outliers, `None` for unflagged rows.
    pub flag_status: Option<FlagStatus>,
}

impl DeviationRecord {
    /// Apply a reviewer decision. Accepted and rejected are terminal; the only
    /// way back to pending is a recompute, which replaces the record.
    pub fn apply_review(&mut self, decision: ReviewDecision) -> ReviewOutcome {
        match self.flag_status {
            None => ReviewOutcome::NotFlagged,
            Some(status) if status.is_terminal() => ReviewOutcome::AlreadyResolved(status),
            Some(_) => {
                let next = match decision {
                    ReviewDecision::Accept => FlagStatus::Accepted,
                    ReviewDecision::Reject => FlagStatus::Rejected,
                };
                self.flag_status = Some(next);
                ReviewOutcome::Applied(next)
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.flag_status == Some(FlagStatus::Pending)
    }
}

/// Evaluate every observation against its category summary, in input order.
///
/// Observations whose category has no summary are compared against the empty
/// summary: zero deviation, never an outlier.
pub fn flag_observations(
    observations: &[PriceObservation],
    summaries: &BTreeMap<String, DistributionSummary>,
    bands: &SeverityBands,
) -> Vec<DeviationRecord> {
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    observations
        .iter()
        .map(|obs| {
            let n = seen
                .entry((obs.category.as_str(), obs.vendor_name.as_str()))
                .or_insert(0);
            let record_id = format!("{}:{}#{}", obs.category, obs.vendor_name, n);
            *n += 1;

            let (median, is_outlier) = match summaries.get(&obs.category) {
                Some(summary) if !summary.is_empty() => {
                    (summary.median, summary.is_outlier(obs.price))
                }
                _ => (0.0, false),
            };
            let pct = deviation_percent(obs.price, median);

            DeviationRecord {
                record_id,
                item: obs.category.clone(),
                vendor: obs.vendor_name.clone(),
                quoted_price: obs.price,
                market_median: median,
                deviation_percent: pct,
                severity: Severity::classify(pct, bands),
                is_outlier,
                flag_status: is_outlier.then_some(FlagStatus::Pending),
            }
        })
        .collect()
}
