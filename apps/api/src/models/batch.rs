use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AnalysisError, ErrorKind};
use crate::models::report::{ReportStatus, ResumeReport, Stage};

const TOP_CANDIDATES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStatus {
    AllSuccess,
    Partial,
    AllFailed,
}

/// Why a resume has no stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureMarker {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl FailureMarker {
    pub fn new(stage: Stage, error: &AnalysisError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn cancelled(stage: Stage) -> Self {
        Self::new(stage, &AnalysisError::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchOutcome {
    Report(Box<ResumeReport>),
    Failed(FailureMarker),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub resume_id: Uuid,
    pub filename: String,
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    /// A resume succeeded when its report completed every requested stage.
    pub fn succeeded(&self) -> bool {
        matches!(
            &self.outcome,
            BatchOutcome::Report(report) if report.status == ReportStatus::Completed
        )
    }

    /// Whether the entry carries an analysed profile, complete or degraded.
    pub fn has_profile(&self) -> bool {
        self.report().is_some_and(|report| report.profile.is_some())
    }

    pub fn report(&self) -> Option<&ResumeReport> {
        match &self.outcome {
            BatchOutcome::Report(report) => Some(report),
            BatchOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub resume_id: Uuid,
    pub filename: String,
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub degraded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub highest_score: Option<u8>,
    pub lowest_score: Option<u8>,
    pub average_score: Option<f64>,
    /// Best matches first, at most ten.
    pub top_candidates: Vec<ScoredCandidate>,
}

impl BatchSummary {
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let mut summary = BatchSummary {
            total: entries.len(),
            ..Default::default()
        };

        let mut scored = Vec::new();
        for entry in entries {
            match &entry.outcome {
                BatchOutcome::Report(report) => {
                    match report.status {
                        ReportStatus::Completed => summary.succeeded += 1,
                        ReportStatus::Degraded => summary.degraded += 1,
                        ReportStatus::ExtractionFailed => summary.failed += 1,
                    }
                    if let Some(score) = report.match_score() {
                        scored.push(ScoredCandidate {
                            resume_id: entry.resume_id,
                            filename: entry.filename.clone(),
                            score,
                        });
                    }
                }
                BatchOutcome::Failed(marker) if marker.kind == ErrorKind::Cancelled => {
                    summary.cancelled += 1
                }
                BatchOutcome::Failed(_) => summary.failed += 1,
            }
        }

        if !scored.is_empty() {
            let total: u32 = scored.iter().map(|c| c.score as u32).sum();
            summary.highest_score = scored.iter().map(|c| c.score).max();
            summary.lowest_score = scored.iter().map(|c| c.score).min();
            summary.average_score = Some(total as f64 / scored.len() as f64);
        }

        // Stable sort keeps input order among equal scores.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(TOP_CANDIDATES);
        summary.top_candidates = scored;
        summary
    }
}

/// Result of one batch run. Entries follow input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub status: BatchStatus,
    pub entries: Vec<BatchEntry>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn new(batch_id: Uuid, entries: Vec<BatchEntry>) -> Self {
        // Degraded reports still carry a profile, so they make a batch partial
        // rather than failed.
        let status = if entries.iter().all(BatchEntry::succeeded) {
            BatchStatus::AllSuccess
        } else if !entries.iter().any(BatchEntry::has_profile) {
            BatchStatus::AllFailed
        } else {
            BatchStatus::Partial
        };
        let summary = BatchSummary::from_entries(&entries);
        Self {
            batch_id,
            status,
            entries,
            summary,
        }
    }
}
