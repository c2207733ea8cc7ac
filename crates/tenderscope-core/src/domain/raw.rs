//! Raw vendor submission values as produced by upstream ingestion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::criterion::VendorId;

/// One raw criterion value, opaque to everything but the normalizer.
///
/// Deserializes untagged: `12.5` → `Number`, `"Yes"` → `Text`,
/// `{"man_months": 300}` → `Structured`. A JSON `null` is not a value; it is
/// carried as `None` by [`Submission::values`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCriterionValue {
    Number(f64),
    Text(String),
    Structured(BTreeMap<String, serde_json::Value>),
}

impl RawCriterionValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Build a structured record from numeric sub-fields.
    pub fn structured<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::Structured(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), serde_json::Value::from(v)))
                .collect(),
        )
    }

    /// Numeric reading of a sub-field. Numeric strings are accepted since
    /// extracted documents frequently carry numbers as text.
    pub fn sub_field(&self, field: &str) -> Option<f64> {
        match self {
            Self::Structured(map) => map.get(field).and_then(json_number),
            _ => None,
        }
    }
}

fn json_number(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// All raw values one vendor submitted, keyed by criterion name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub vendor_id: VendorId,
    #[serde(default)]
    pub values: BTreeMap<String, Option<RawCriterionValue>>,
}

impl Submission {
    pub fn new(vendor_id: impl Into<String>) -> Self {
        Self {
            vendor_id: VendorId::new(vendor_id),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, criterion_name: impl Into<String>, value: RawCriterionValue) -> Self {
        self.values.insert(criterion_name.into(), Some(value));
        self
    }

    /// Raw value for a criterion name; `None` when absent or null.
    pub fn value(&self, criterion_name: &str) -> Option<&RawCriterionValue> {
        self.values.get(criterion_name).and_then(Option::as_ref)
    }
}
