//! Benchmark report: per-category distributions plus deviation records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::deviation::{self, DeviationRecord, FlagStatus};
use crate::distribution::{self, DistributionSummary};
use crate::domain::PriceObservation;

/// Everything benchmarking derives from a tender's price observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Keyed by price category.
    pub summaries: BTreeMap<String, DistributionSummary>,
    /// One record per observation, in submission order.
    pub records: Vec<DeviationRecord>,
}

impl BenchmarkReport {
    /// Compute summaries and deviation records from scratch. Deterministic:
    /// the same observations always produce an identical report.
    pub fn compute(observations: &[PriceObservation], config: &EngineConfig) -> Self {
        let mut by_category: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for obs in observations {
            by_category
                .entry(obs.category.as_str())
                .or_default()
                .push(obs.price);
        }

        let summaries: BTreeMap<String, DistributionSummary> = by_category
            .into_iter()
            .map(|(category, prices)| {
                (
                    category.to_string(),
                    distribution::summarize_with(category, &prices, config.tukey_multiplier),
                )
            })
            .collect();

        let records = deviation::flag_observations(observations, &summaries, &config.severity);
        Self { summaries, records }
    }

    pub fn record(&self, record_id: &str) -> Option<&DeviationRecord> {
        self.records.iter().find(|r| r.record_id == record_id)
    }

    pub(crate) fn record_mut(&mut self, record_id: &str) -> Option<&mut DeviationRecord> {
        self.records.iter_mut().find(|r| r.record_id == record_id)
    }

    pub fn outliers(&self) -> impl Iterator<Item = &DeviationRecord> {
        self.records.iter().filter(|r| r.is_outlier)
    }

    /// Number of flagged records with the given status.
    pub fn count_with_status(&self, status: FlagStatus) -> usize {
        self.records
            .iter()
            .filter(|r| r.flag_status == Some(status))
            .count()
    }
}
