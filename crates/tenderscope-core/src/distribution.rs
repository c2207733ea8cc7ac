//! Distribution analyzer: five-number summary and Tukey outliers.
//!
//! Quartiles use the median-of-halves method. For odd counts the halves
//! exclude the median element. Collections of one or two prices have
//! `Q1 = Q3 = median`, so the IQR is zero and every price that differs from
//! the median is an outlier.

use serde::{Deserialize, Serialize};

/// Classic Tukey multiplier.
pub const TUKEY_K: f64 = 1.5;

/// Five-number summary of one price category plus its outlier set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub category: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Outlying prices in ascending order.
    pub outliers: Vec<f64>,
}

impl DistributionSummary {
    /// Degenerate summary for a category with no usable prices.
    pub fn empty(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            count: 0,
            min: 0.0,
            q1: 0.0,
            median: 0.0,
            q3: 0.0,
            max: 0.0,
            iqr: 0.0,
            lower_fence: 0.0,
            upper_fence: 0.0,
            outliers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether `price` falls outside the Tukey fences. Always false for an
    /// empty summary.
    pub fn is_outlier(&self, price: f64) -> bool {
        !self.is_empty() && (price < self.lower_fence || price > self.upper_fence)
    }
}

/// Summarize a price collection with the classic 1.5 multiplier.
pub fn summarize(category: impl Into<String>, prices: &[f64]) -> DistributionSummary {
    summarize_with(category, prices, TUKEY_K)
}

/// Summarize a price collection with an explicit fence multiplier.
///
/// Non-finite prices are dropped; an empty collection yields
/// [`DistributionSummary::empty`].
pub fn summarize_with(category: impl Into<String>, prices: &[f64], k: f64) -> DistributionSummary {
    let category = category.into();
    let mut sorted: Vec<f64> = prices.iter().copied().filter(|p| p.is_finite()).collect();
    if sorted.is_empty() {
        return DistributionSummary::empty(category);
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let median = median_of(&sorted);
    let (q1, q3) = if n < 3 {
        (median, median)
    } else {
        let half = n / 2;
        let lower = &sorted[..half];
        let upper = if n % 2 == 0 {
            &sorted[half..]
        } else {
            &sorted[half + 1..]
        };
        (median_of(lower), median_of(upper))
    };

    let iqr = q3 - q1;
    let lower_fence = q1 - k * iqr;
    let upper_fence = q3 + k * iqr;
    let outliers = sorted
        .iter()
        .copied()
        .filter(|p| *p < lower_fence || *p > upper_fence)
        .collect();

    DistributionSummary {
        category,
        count: n,
        min: sorted[0],
        q1,
        median,
        q3,
        max: sorted[n - 1],
        iqr,
        lower_fence,
        upper_fence,
        outliers,
    }
}

/// Median of an already sorted, non-empty slice.
fn median_of(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let mid = n / 2;
    if n % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
