//! Normalized per-criterion scores.

use serde::{Deserialize, Serialize};

use super::criterion::{CriterionId, VendorId};

/// Whether a score was derived by the normalizer or set by a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Machine,
    Human,
}

/// Score of one vendor on one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub criterion_id: CriterionId,
    pub vendor_id: VendorId,
    /// Canonical 0–10 value.
    pub value: f64,
    /// 0–1.
    pub confidence: f64,
    pub provenance: Provenance,
}

impl Score {
    pub fn machine(
        criterion_id: CriterionId,
        vendor_id: VendorId,
        value: f64,
        confidence: f64,
    ) -> Self {
        Self {
            criterion_id,
            vendor_id,
            value: clamp_unit(value, 10.0),
            confidence: clamp_unit(confidence, 1.0),
            provenance: Provenance::Machine,
        }
    }

    pub fn human(criterion_id: CriterionId, vendor_id: VendorId, value: f64) -> Self {
        Self {
            criterion_id,
            vendor_id,
            value: clamp_unit(value, 10.0),
            confidence: 1.0,
            provenance: Provenance::Human,
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.provenance == Provenance::Human
    }

    /// The 0–100 value shown to operators.
    pub fn ui_value(&self) -> f64 {
        self.value * 10.0
    }
}

fn clamp_unit(v: f64, max: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, max)
    } else {
        0.0
    }
}
