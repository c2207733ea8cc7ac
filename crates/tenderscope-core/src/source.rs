//! Upstream collaborator seam for tender data.
//!
//! Ingestion (vendors, criteria, raw submissions) and market data (price
//! observations) live outside the engine. `TenderSource` is the async,
//! backend-agnostic boundary; [`MemoryTenderSource`] is an in-memory fake
//! for tests and for driving the engine from a JSON document.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Criterion, PriceObservation, SourceError, Submission, Vendor};

/// Result type for source operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Everything the engine consumes for one tender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenderData {
    pub tender_id: String,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(default)]
    pub observations: Vec<PriceObservation>,
}

/// Read access to a tender's inputs.
///
/// Returns `SourceError::TenderNotFound` for unknown tenders.
#[async_trait]
pub trait TenderSource: Send + Sync {
    async fn tender_vendors(&self, tender_id: &str) -> SourceResult<Vec<Vendor>>;

    async fn tender_criteria(&self, tender_id: &str) -> SourceResult<Vec<Criterion>>;

    /// Raw submissions, one per vendor.
    async fn tender_submissions(&self, tender_id: &str) -> SourceResult<Vec<Submission>>;

    /// Market and quoted prices for the tender's benchmarking round.
    async fn price_observations(&self, tender_id: &str) -> SourceResult<Vec<PriceObservation>>;
}

// ---------------------------------------------------------------------------
// MemoryTenderSource
// ---------------------------------------------------------------------------

/// In-memory source backed by a `HashMap<tender_id, TenderData>`.
#[derive(Debug, Default)]
pub struct MemoryTenderSource {
    tenders: Mutex<HashMap<String, TenderData>>,
    latency: Option<Duration>,
    calls: AtomicU64,
}

impl MemoryTenderSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, data: TenderData) {
        let mut tenders = self.tenders.lock().unwrap_or_else(|e| e.into_inner());
        tenders.insert(data.tender_id.clone(), data);
    }

    /// Total number of trait calls served.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn read<T>(
        &self,
        tender_id: &str,
        pick: impl FnOnce(&TenderData) -> T + Send,
    ) -> SourceResult<T> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let tenders = self.tenders.lock().unwrap_or_else(|e| e.into_inner());
        tenders
            .get(tender_id)
            .map(pick)
            .ok_or_else(|| SourceError::TenderNotFound(tender_id.to_string()))
    }
}

impl From<TenderData> for MemoryTenderSource {
    fn from(data: TenderData) -> Self {
        let source = Self::new();
        source.insert(data);
        source
    }
}

#[async_trait]
impl TenderSource for MemoryTenderSource {
    async fn tender_vendors(&self, tender_id: &str) -> SourceResult<Vec<Vendor>> {
        self.read(tender_id, |t| t.vendors.clone()).await
    }

    async fn tender_criteria(&self, tender_id: &str) -> SourceResult<Vec<Criterion>> {
        self.read(tender_id, |t| t.criteria.clone()).await
    }

    async fn tender_submissions(&self, tender_id: &str) -> SourceResult<Vec<Submission>> {
        self.read(tender_id, |t| t.submissions.clone()).await
    }

    async fn price_observations(&self, tender_id: &str) -> SourceResult<Vec<PriceObservation>> {
        self.read(tender_id, |t| t.observations.clone()).await
    }
}
