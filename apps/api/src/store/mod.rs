pub mod archive;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::report::{ReportStatus, ResumeReport};

pub use archive::{NoopArchive, ResumeArchive, S3Archive};
pub use postgres::PgResultStore;

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report {0} not found")]
    NotFound(Uuid),

    #[error("report {0} already exists")]
    Conflict(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListFilter {
    pub status: Option<ReportStatus>,
    pub limit: usize,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListFilter {
    pub fn new(status: Option<ReportStatus>, limit: Option<usize>) -> Self {
        Self {
            status,
            limit: limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT),
        }
    }
}

/// Listing row for a stored report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub resume_id: Uuid,
    pub filename: String,
    pub status: ReportStatus,
    pub match_score: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl ReportSummary {
    pub(crate) fn from_report(report: &ResumeReport) -> Self {
        Self {
            resume_id: report.resume_id,
            filename: report.filename.clone(),
            status: report.status,
            match_score: report.match_score(),
            created_at: report.processed_at,
        }
    }
}

/// Persistence boundary for analysis results.
///
/// Reports are write-once: `put` for an id that already has a report fails
/// with `Conflict` and leaves the stored report untouched.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn put(&self, report: &ResumeReport) -> Result<(), StoreError>;

    async fn get(&self, resume_id: Uuid) -> Result<ResumeReport, StoreError>;

    /// Newest first.
    async fn list(&self, filter: ListFilter) -> Result<Vec<ReportSummary>, StoreError>;

    /// Removes the report for `resume_id`; `NotFound` when there is none.
    async fn delete(&self, resume_id: Uuid) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryResultStore {
    reports: RwLock<HashMap<Uuid, ResumeReport>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn put(&self, report: &ResumeReport) -> Result<(), StoreError> {
        let mut reports = self.reports.write().await;
        if reports.contains_key(&report.resume_id) {
            return Err(StoreError::Conflict(report.resume_id));
        }
        reports.insert(report.resume_id, report.clone());
        Ok(())
    }

    async fn get(&self, resume_id: Uuid) -> Result<ResumeReport, StoreError> {
        self.reports
            .read()
            .await
            .get(&resume_id)
            .cloned()
            .ok_or(StoreError::NotFound(resume_id))
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<ReportSummary>, StoreError> {
        let reports = self.reports.read().await;
        let mut rows: Vec<ReportSummary> = reports
            .values()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .map(ReportSummary::from_report)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(filter.limit);
        Ok(rows)
    }

    async fn delete(&self, resume_id: Uuid) -> Result<(), StoreError> {
        self.reports
            .write()
            .await
            .remove(&resume_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(resume_id))
    }
}
