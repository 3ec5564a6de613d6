use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::models::report::ResumeReport;
use crate::store::{ListFilter, ReportSummary, ResultStore, StoreError};

/// `created_at` holds the report's `processed_at`; listings order by it.
const INSERT_REPORT: &str = r#"
    INSERT INTO resume_reports (resume_id, filename, status, match_score, report, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (resume_id) DO NOTHING
"#;

const LIST_REPORTS: &str = r#"
    SELECT resume_id, filename, status, match_score, created_at
    FROM resume_reports
    WHERE ($1::text IS NULL OR status = $1)
    ORDER BY created_at DESC
    LIMIT $2
"#;

/// Postgres-backed store over the `resume_reports` table.
/// Rows are inserted once and never updated; `delete` removes them.
#[derive(Clone)]
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReportRow {
    report: Json<ResumeReport>,
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    resume_id: Uuid,
    filename: String,
    status: String,
    match_score: Option<i16>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SummaryRow> for ReportSummary {
    type Error = StoreError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|e: String| {
            StoreError::Database(sqlx::Error::Decode(e.into()))
        })?;
        Ok(ReportSummary {
            resume_id: row.resume_id,
            filename: row.filename,
            status,
            match_score: row.match_score.and_then(|s| u8::try_from(s).ok()),
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn put(&self, report: &ResumeReport) -> Result<(), StoreError> {
        let result = sqlx::query(INSERT_REPORT)
            .bind(report.resume_id)
            .bind(&report.filename)
            .bind(report.status.as_str())
            .bind(report.match_score().map(i16::from))
            .bind(serde_json::to_value(report)?)
            .bind(report.processed_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(report.resume_id));
        }

        info!(
            "Stored report for resume {} ({})",
            report.resume_id, report.status
        );
        Ok(())
    }

    async fn get(&self, resume_id: Uuid) -> Result<ResumeReport, StoreError> {
        let row = sqlx::query_as::<_, ReportRow>(
            "SELECT report FROM resume_reports WHERE resume_id = $1",
        )
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(resume_id))?;

        Ok(row.report.0)
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<ReportSummary>, StoreError> {
        let rows = sqlx::query_as::<_, SummaryRow>(LIST_REPORTS)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ReportSummary::try_from).collect()
    }

    async fn delete(&self, resume_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM resume_reports WHERE resume_id = $1")
            .bind(resume_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(resume_id));
        }

        info!("Deleted report for resume {resume_id}");
        Ok(())
    }
}
