//! Frozen copy of a scoring matrix taken at lock time.
//!
//! The snapshot carries a SHA-256 digest of its canonical JSON content so the
//! locked matrix handed to benchmarking can be verified later. The lock
//! timestamp and actor are outside the digested content: two identical
//! matrices always digest identically.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::aggregator::{CategoryScore, WeightAlignment};
use crate::domain::{Category, Criterion, Result, Score, TenderError, Vendor};
use crate::lifecycle::Role;
use crate::matrix::ScoreMatrix;

/// SHA-256 hex digest of a snapshot's canonical content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotDigest(String);

impl SnapshotDigest {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        SnapshotDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for SnapshotDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The digested part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotContent {
    pub tender_id: String,
    pub criteria: Vec<Criterion>,
    pub vendors: Vec<Vendor>,
    /// In (criterion, vendor) order.
    pub scores: Vec<Score>,
    pub rankings: BTreeMap<Category, Vec<CategoryScore>>,
    pub alignments: Vec<WeightAlignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSnapshot {
    pub content: SnapshotContent,
    pub digest: SnapshotDigest,
    pub locked_by: Role,
    pub locked_at: DateTime<Utc>,
}

impl MatrixSnapshot {
    pub fn capture(
        tender_id: &str,
        matrix: &ScoreMatrix,
        weight_tolerance: f64,
        locked_by: Role,
        locked_at: DateTime<Utc>,
    ) -> Result<Self> {
        let categories = matrix.active_categories();
        let content = SnapshotContent {
            tender_id: tender_id.to_string(),
            criteria: matrix.criteria().to_vec(),
            vendors: matrix.vendors().to_vec(),
            scores: matrix.scores().cloned().collect(),
            rankings: categories
                .iter()
                .map(|c| (*c, matrix.ranking(*c)))
                .collect(),
            alignments: categories
                .iter()
                .map(|c| matrix.alignment(*c, weight_tolerance))
                .collect(),
        };
        let digest = digest_of(&content)?;
        Ok(Self {
            content,
            digest,
            locked_by,
            locked_at,
        })
    }

    /// Recompute the digest and compare it with the stored one.
    pub fn verify(&self) -> Result<()> {
        let actual = digest_of(&self.content)?;
        if actual != self.digest {
            return Err(TenderError::DigestMismatch {
                expected: self.digest.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

fn digest_of(content: &SnapshotContent) -> Result<SnapshotDigest> {
    let json = serde_json::to_vec(content)?;
    Ok(SnapshotDigest::from_bytes(&json))
}
