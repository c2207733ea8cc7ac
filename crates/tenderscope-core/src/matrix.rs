//! The scoring matrix: criteria × vendors → scores.
//!
//! The matrix itself knows nothing about locking; [`crate::session`] checks
//! the lifecycle state before calling any mutator here.

use std::collections::BTreeMap;

use crate::aggregator::{self, CategoryScore, WeightAlignment};
use crate::domain::{Category, Criterion, CriterionId, Result, Score, TenderError, Vendor, VendorId};

#[derive(Debug, Clone, Default)]
pub struct ScoreMatrix {
    criteria: Vec<Criterion>,
    vendors: Vec<Vendor>,
    scores: BTreeMap<(CriterionId, VendorId), Score>,
}

impl ScoreMatrix {
    pub fn new(criteria: Vec<Criterion>, vendors: Vec<Vendor>) -> Self {
        Self {
            criteria,
            vendors,
            scores: BTreeMap::new(),
        }
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn vendors(&self) -> &[Vendor] {
        &self.vendors
    }

    pub fn criterion(&self, id: &CriterionId) -> Result<&Criterion> {
        self.criteria
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| TenderError::UnknownCriterion(id.to_string()))
    }

    pub fn vendor(&self, id: &VendorId) -> Result<&Vendor> {
        self.vendors
            .iter()
            .find(|v| &v.id == id)
            .ok_or_else(|| TenderError::UnknownVendor(id.to_string()))
    }

    pub fn score(&self, criterion: &CriterionId, vendor: &VendorId) -> Option<&Score> {
        self.scores.get(&(criterion.clone(), vendor.clone()))
    }

    /// All scores in (criterion, vendor) order.
    pub fn scores(&self) -> impl Iterator<Item = &Score> {
        self.scores.values()
    }

    /// Replace a criterion's weight, returning the previous one.
    pub(crate) fn set_weight(&mut self, id: &CriterionId, weight: f64) -> Result<f64> {
        let criterion = self
            .criteria
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| TenderError::UnknownCriterion(id.to_string()))?;
        Ok(std::mem::replace(&mut criterion.weight, weight))
    }

    /// Store a machine-derived score unless a human override already holds
    /// the slot. Returns whether the score was stored.
    pub(crate) fn put_machine(&mut self, score: Score) -> bool {
        let key = (score.criterion_id.clone(), score.vendor_id.clone());
        match self.scores.get(&key) {
            Some(existing) if existing.is_overridden() => false,
            _ => {
                self.scores.insert(key, score);
                true
            }
        }
    }

    /// Store a score unconditionally (human override or override reset).
    pub(crate) fn put(&mut self, score: Score) {
        let key = (score.criterion_id.clone(), score.vendor_id.clone());
        self.scores.insert(key, score);
    }

    fn category_criteria(&self, category: Category) -> Vec<&Criterion> {
        self.criteria
            .iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// A vendor's aggregate (0–10) in one category.
    pub fn category_score(&self, vendor: &VendorId, category: Category) -> f64 {
        let criteria = self.category_criteria(category);
        let scores: Vec<&Score> = self
            .scores
            .values()
            .filter(|s| &s.vendor_id == vendor)
            .collect();
        aggregator::aggregate(&criteria, &scores)
    }

    /// All vendors ranked within a category.
    pub fn ranking(&self, category: Category) -> Vec<CategoryScore> {
        let rows = self
            .vendors
            .iter()
            .map(|v| (v.id.clone(), self.category_score(&v.id, category)))
            .collect();
        aggregator::rank(category, rows)
    }

    pub fn alignment(&self, category: Category, tolerance: f64) -> WeightAlignment {
        aggregator::check_alignment(&self.criteria, category, tolerance)
    }

    /// Categories that have at least one criterion, in enumeration order.
    pub fn active_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|cat| self.criteria.iter().any(|c| c.category == *cat))
            .collect()
    }
}
