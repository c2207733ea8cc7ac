//! Evaluation criteria, their categories, and the vendors they score.

use serde::{Deserialize, Serialize};

/// Fixed enumeration of criterion categories. Each category carries its own
/// 100-point weight budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Financial,
    Esg,
    Innovation,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Technical,
        Category::Financial,
        Category::Esg,
        Category::Innovation,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Technical => write!(f, "technical"),
            Self::Financial => write!(f, "financial"),
            Self::Esg => write!(f, "esg"),
            Self::Innovation => write!(f, "innovation"),
        }
    }
}

/// Stable criterion identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriterionId(pub String);

impl CriterionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CriterionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single evaluated aspect of a vendor submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    /// Display name. Raw submission values are keyed by this name.
    pub name: String,
    pub category: Category,
    /// Operator-assigned weight in 0–100.
    pub weight: f64,
}

impl Criterion {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        weight: f64,
    ) -> Self {
        Self {
            id: CriterionId::new(id),
            name: name.into(),
            category,
            weight,
        }
    }
}

/// Stable vendor identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub String);

impl VendorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bidding vendor. Immutable once the tender enters evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
}

impl Vendor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: VendorId::new(id),
            name: name.into(),
        }
    }
}
