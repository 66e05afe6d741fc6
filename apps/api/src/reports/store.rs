//! Report Store: owner-scoped persistence of analysis reports with a 60-day TTL.
//!
//! Every read filters on both `owner_id` and `expires_at > now`, so an expired
//! report is invisible even before the background sweeper deletes it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::reports::models::{AnalysisReport, ReportListing};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored report is corrupt: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persists a new report and returns its id.
    async fn save(&self, report: &AnalysisReport) -> Result<Uuid, StoreError>;

    /// `None` when the report is absent, owned by someone else, or expired.
    async fn find_by_id(&self, id: Uuid, owner: Uuid)
        -> Result<Option<AnalysisReport>, StoreError>;

    /// Live reports for `owner`, newest first.
    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<ReportListing>, StoreError>;

    /// Returns `true` if a live report owned by `owner` was removed.
    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;

    /// Removes every report with `expires_at <= now`, returning how many went.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    fn name(&self) -> &'static str;
}

/// In-process store for tests and `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: RwLock<HashMap<Uuid, AnalysisReport>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn save(&self, report: &AnalysisReport) -> Result<Uuid, StoreError> {
        self.reports
            .write()
            .await
            .insert(report.analysis_id, report.clone());
        Ok(report.analysis_id)
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<AnalysisReport>, StoreError> {
        let now = Utc::now();
        Ok(self
            .reports
            .read()
            .await
            .get(&id)
            .filter(|r| r.owner_id == owner && !r.is_expired(now))
            .cloned())
    }

    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<ReportListing>, StoreError> {
        let now = Utc::now();
        let reports = self.reports.read().await;
        let mut rows: Vec<&AnalysisReport> = reports
            .values()
            .filter(|r| r.owner_id == owner && !r.is_expired(now))
            .collect();
        rows.sort_by(|a, b| b.analysis_date.cmp(&a.analysis_date));
        Ok(rows.into_iter().map(AnalysisReport::listing).collect())
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let now = Utc::now();
        let mut reports = self.reports.write().await;
        let live = reports
            .get(&id)
            .is_some_and(|r| r.owner_id == owner && !r.is_expired(now));
        if live {
            reports.remove(&id);
        }
        Ok(live)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|_, r| !r.is_expired(now));
        Ok((before - reports.len()) as u64)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
