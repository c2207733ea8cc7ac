//! Weighted aggregation of per-criterion scores into category scores.

use serde::{Deserialize, Serialize};

use crate::domain::{Category, Criterion, Score, VendorId};

/// Weight budget every category should sum to.
pub const WEIGHT_BUDGET: f64 = 100.0;

/// Σ(score_i × weight_i) / Σ(weight_i) over `criteria`.
///
/// `scores` are one vendor's scores; a criterion with no score counts as 0.
/// A zero (or non-positive) weight sum yields 0.
pub fn aggregate(criteria: &[&Criterion], scores: &[&Score]) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for criterion in criteria {
        let weight = criterion.weight.max(0.0);
        let value = scores
            .iter()
            .find(|s| s.criterion_id == criterion.id)
            .map(|s| s.value)
            .unwrap_or(0.0);
        weighted += value * weight;
        total_weight += weight;
    }
    if total_weight <= 0.0 {
        return 0.0;
    }
    weighted / total_weight
}

/// Result of comparing a category's weight sum against the 100-point budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAlignment {
    pub category: Category,
    pub total_weight: f64,
    /// `total_weight − 100`.
    pub deviation: f64,
    pub aligned: bool,
}

/// Check a category's weight sum. Misalignment is a warning for the caller,
/// never a failure.
pub fn check_alignment(criteria: &[Criterion], category: Category, tolerance: f64) -> WeightAlignment {
    let total_weight: f64 = criteria
        .iter()
        .filter(|c| c.category == category)
        .map(|c| c.weight)
        .sum();
    let deviation = total_weight - WEIGHT_BUDGET;
    WeightAlignment {
        category,
        total_weight,
        deviation,
        aligned: deviation.abs() <= tolerance,
    }
}

/// One vendor's aggregate in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub vendor_id: VendorId,
    pub category: Category,
    /// 0–10.
    pub score: f64,
    /// 0–100, as shown to operators.
    pub ui_score: f64,
    /// 1-based position within the category.
    pub rank: usize,
}

/// Order vendors by aggregate (highest first, ties by vendor id) and assign
/// ranks.
pub fn rank(category: Category, mut rows: Vec<(VendorId, f64)>) -> Vec<CategoryScore> {
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.into_iter()
        .enumerate()
        .map(|(i, (vendor_id, score))| CategoryScore {
            vendor_id,
            category,
            score,
            ui_score: score * 10.0,
            rank: i + 1,
        })
        .collect()
}
