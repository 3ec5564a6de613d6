use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AnalysisError, ErrorKind};
use crate::matching::JobMatchReport;
use crate::models::profile::ExtractedProfile;
use crate::questions::QuestionSet;

/// An uploaded PDF, immutable once received.
#[derive(Debug, Clone)]
pub struct RawResume {
    pub id: Uuid,
    pub filename: String,
    pub bytes: Bytes,
    pub uploaded_at: DateTime<Utc>,
}

impl RawResume {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            bytes: bytes.into(),
            uploaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every requested stage produced output.
    Completed,
    /// Extraction succeeded but a later stage failed.
    Degraded,
    ExtractionFailed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Completed => "completed",
            ReportStatus::Degraded => "degraded",
            ReportStatus::ExtractionFailed => "extraction_failed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(ReportStatus::Completed),
            "degraded" => Ok(ReportStatus::Degraded),
            "extraction_failed" => Ok(ReportStatus::ExtractionFailed),
            other => Err(format!("unknown report status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for a worker slot.
    Queued,
    Extraction,
    Matching,
    Questions,
    Persistence,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Queued => "queued",
            Stage::Extraction => "extraction",
            Stage::Matching => "matching",
            Stage::Questions => "questions",
            Stage::Persistence => "persistence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, error: &AnalysisError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Aggregate analysis result for one resume. Never mutated once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeReport {
    pub resume_id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
    pub job_description: Option<String>,
    pub status: ReportStatus,
    pub profile: Option<ExtractedProfile>,
    /// Present only when a job description was supplied and matching succeeded.
    pub job_match: Option<JobMatchReport>,
    pub questions: Option<QuestionSet>,
    pub errors: Vec<StageError>,
}

impl ResumeReport {
    /// Report for a resume whose extraction stage failed terminally.
    pub fn extraction_failed(
        raw: &RawResume,
        job_description: Option<&str>,
        error: &AnalysisError,
    ) -> Self {
        Self {
            resume_id: raw.id,
            filename: raw.filename.clone(),
            uploaded_at: raw.uploaded_at,
            processed_at: Utc::now(),
            job_description: job_description.map(str::to_owned),
            status: ReportStatus::ExtractionFailed,
            profile: None,
            job_match: None,
            questions: None,
            errors: vec![StageError::new(Stage::Extraction, error)],
        }
    }

    pub fn match_score(&self) -> Option<u8> {
        self.job_match.as_ref().map(|m| m.score)
    }

    pub fn status_view(&self) -> ReportStatusView {
        ReportStatusView {
            resume_id: self.resume_id,
            status: self.status,
            processed_at: self.processed_at,
            errors: self.errors.clone(),
        }
    }
}

/// Status-only projection of a stored report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatusView {
    pub resume_id: Uuid,
    pub status: ReportStatus,
    pub processed_at: DateTime<Utc>,
    pub errors: Vec<StageError>,
}
