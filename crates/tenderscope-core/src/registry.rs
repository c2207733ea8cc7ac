//! Registry of live tender sessions.
//!
//! Each tender gets its own `tokio::sync::RwLock`, so operations on one
//! tender are serialized while distinct tenders proceed in parallel. Loads
//! from a [`TenderSource`] are memoized per tender id and bounded by the
//! configured source timeout. The registry map itself is only ever locked
//! for a lookup or an insert, never across a collaborator call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{OnceCell, RwLock};
use tracing::instrument;

use crate::benchmark::BenchmarkReport;
use crate::config::EngineConfig;
use crate::domain::{Result, TenderError};
use crate::metrics::METRICS;
use crate::obs;
use crate::session::TenderSession;
use crate::source::TenderSource;

/// Shared handle to one tender's session.
pub type SessionHandle = Arc<RwLock<TenderSession>>;

/// In-flight load of one tender, shared by every caller waiting on it.
type PendingLoad = Arc<OnceCell<SessionHandle>>;

#[derive(Debug, Default)]
pub struct TenderRegistry {
    config: EngineConfig,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    pending: Mutex<HashMap<String, PendingLoad>>,
}

impl TenderRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a session, replacing any existing one with the same id.
    pub async fn insert(&self, session: TenderSession) -> SessionHandle {
        let id = session.tender_id().to_string();
        let handle = Arc::new(RwLock::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    pub async fn get(&self, tender_id: &str) -> Result<SessionHandle> {
        self.lookup(tender_id)
            .await
            .ok_or_else(|| TenderError::TenderNotFound(tender_id.to_string()))
    }

    async fn lookup(&self, tender_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(tender_id).cloned()
    }

    /// Return the registered session, loading it from `source` on first use.
    ///
    /// Concurrent callers for the same tender share one load. Callers for
    /// other tenders are never held up by it.
    #[instrument(skip_all, fields(tender_id = %tender_id))]
    pub async fn get_or_load(
        &self,
        tender_id: &str,
        source: &dyn TenderSource,
    ) -> Result<SessionHandle> {
        if let Some(handle) = self.lookup(tender_id).await {
            return Ok(handle);
        }

        let cell = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(pending.entry(tender_id.to_string()).or_default())
        };
        let loaded = cell
            .get_or_try_init(|| async {
                // A load that finished between the lookup and taking the
                // cell has already registered the session.
                if let Some(handle) = self.lookup(tender_id).await {
                    return Ok(handle);
                }
                let session = self.load(tender_id, source).await?;
                tracing::info!(
                    event = "tender.loaded",
                    tender_id = %tender_id,
                    criteria = session.matrix().criteria().len(),
                    vendors = session.matrix().vendors().len(),
                );
                let handle = Arc::new(RwLock::new(session));
                let mut sessions = self.sessions.write().await;
                Ok::<_, TenderError>(Arc::clone(
                    sessions.entry(tender_id.to_string()).or_insert(handle),
                ))
            })
            .await
            .cloned();

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending
            .get(tender_id)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            pending.remove(tender_id);
        }
        loaded
    }

    /// Run `f` with exclusive access to one tender's session.
    pub async fn with_session<R>(
        &self,
        tender_id: &str,
        f: impl FnOnce(&mut TenderSession) -> R,
    ) -> Result<R> {
        let handle = self.get(tender_id).await?;
        let mut session = handle.write().await;
        Ok(f(&mut *session))
    }

    /// Fetch the round's price observations from `source` and forward the
    /// locked matrix to benchmarking.
    pub async fn begin_benchmarking(
        &self,
        tender_id: &str,
        source: &dyn TenderSource,
    ) -> Result<BenchmarkReport> {
        let handle = self.get(tender_id).await?;
        let observations = self
            .bounded(tender_id, source.price_observations(tender_id))
            .await??;
        let mut session = handle.write().await;
        session.enter_benchmarking(observations).cloned()
    }

    /// Registered tender ids, sorted.
    pub async fn tender_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn remove(&self, tender_id: &str) -> bool {
        self.sessions.write().await.remove(tender_id).is_some()
    }

    async fn load(&self, tender_id: &str, source: &dyn TenderSource) -> Result<TenderSession> {
        let fetch = async {
            let criteria = source.tender_criteria(tender_id).await?;
            let vendors = source.tender_vendors(tender_id).await?;
            let submissions = source.tender_submissions(tender_id).await?;
            Ok::<_, crate::domain::SourceError>((criteria, vendors, submissions))
        };
        let (criteria, vendors, submissions) = self.bounded(tender_id, fetch).await??;

        let mut session = TenderSession::new(tender_id, criteria, vendors, self.config.clone());
        for submission in submissions {
            match session.ingest(submission) {
                Ok(_) => {}
                Err(TenderError::UnknownVendor(vendor)) => {
                    METRICS.inc_submissions_skipped();
                    obs::emit_submission_skipped(tender_id, &vendor);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(session)
    }

    async fn bounded<T>(
        &self,
        tender_id: &str,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T> {
        tokio::time::timeout(self.config.source_timeout(), fut)
            .await
            .map_err(|_elapsed| {
                tracing::warn!(event = "source.timeout", tender_id = %tender_id);
                TenderError::SourceTimeout {
                    tender_id: tender_id.to_string(),
                    timeout_ms: self.config.source_timeout_ms,
                }
            })
    }
}
