//! Market price observations collected during benchmarking.

use serde::{Deserialize, Serialize};

/// One observed price in a market category (e.g. "steel").
///
/// Observations are append-only for a tender round; nothing edits them after
/// submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub category: String,
    pub vendor_name: String,
    pub price: f64,
}

impl PriceObservation {
    pub fn new(category: impl Into<String>, vendor_name: impl Into<String>, price: f64) -> Self {
        Self {
            category: category.into(),
            vendor_name: vendor_name.into(),
            price,
        }
    }
}
