//! Analysis pipeline for a single resume.
//!
//! extraction → (matching ∥ questions) → persistence
//!
//! Extraction failure ends the pipeline; matching and question failures only
//! degrade the report. Nothing in here retries: that is the AI client's job.

pub mod cancel;
pub mod coordinator;
pub mod events;
pub mod hiring_report;

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::AnalysisError;
use crate::extraction::ResumeExtractionService;
use crate::matching::JobMatchService;
use crate::models::batch::{BatchOutcome, FailureMarker};
use crate::models::report::{RawResume, ReportStatus, ResumeReport, Stage, StageError};
use crate::questions::QuestionGenerationService;
use crate::store::ResultStore;

use cancel::CancelSignal;
use events::{EventOutcome, EventSink, PipelineEvent};

pub use coordinator::BatchCoordinator;

/// Why `assemble` produced no report.
struct StageFailure {
    stage: Stage,
    error: AnalysisError,
}

pub struct ResumePipeline {
    extraction: ResumeExtractionService,
    matching: JobMatchService,
    questions: QuestionGenerationService,
    store: Arc<dyn ResultStore>,
    events: Arc<dyn EventSink>,
}

impl ResumePipeline {
    pub fn new(
        extraction: ResumeExtractionService,
        matching: JobMatchService,
        questions: QuestionGenerationService,
        store: Arc<dyn ResultStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            extraction,
            matching,
            questions,
            store,
            events,
        }
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Single-resume entry point.
    ///
    /// Extraction failures and cancellation are returned as errors and nothing
    /// is stored. A report whose later stages failed is stored as `degraded`.
    pub async fn analyze(
        &self,
        resume: &RawResume,
        job_description: Option<&str>,
        cancel: &CancelSignal,
    ) -> Result<ResumeReport, AnalysisError> {
        let report = self
            .assemble(resume, job_description, cancel)
            .await
            .map_err(|failure| failure.error)?;
        self.persist(&report).await?;
        Ok(report)
    }

    /// Batch entry point. Never fails: every outcome is either a stored report
    /// (including `extraction_failed` ones) or a failure marker.
    pub async fn run(
        &self,
        resume: &RawResume,
        job_description: Option<&str>,
        cancel: &CancelSignal,
    ) -> BatchOutcome {
        let report = match self.assemble(resume, job_description, cancel).await {
            Ok(report) => report,
            Err(StageFailure {
                stage,
                error: AnalysisError::Cancelled,
            }) => return BatchOutcome::Failed(FailureMarker::cancelled(stage)),
            Err(StageFailure { error, .. }) => {
                ResumeReport::extraction_failed(resume, normalize_jd(job_description), &error)
            }
        };

        match self.persist(&report).await {
            Ok(()) => BatchOutcome::Report(Box::new(report)),
            Err(e) => BatchOutcome::Failed(FailureMarker::new(Stage::Persistence, &e)),
        }
    }

    async fn assemble(
        &self,
        resume: &RawResume,
        job_description: Option<&str>,
        cancel: &CancelSignal,
    ) -> Result<ResumeReport, StageFailure> {
        let job_description = normalize_jd(job_description);

        let started = Instant::now();
        let profile = self.extraction.extract(resume, cancel).await;
        self.record(Stage::Extraction, resume.id, &profile, started);
        let profile = profile.map_err(|error| StageFailure {
            stage: Stage::Extraction,
            error,
        })?;

        let matching = async {
            let Some(jd) = job_description else {
                self.skip(Stage::Matching, resume.id);
                return None;
            };
            let started = Instant::now();
            let result = self.matching.match_profile(&profile, jd, cancel).await;
            self.record(Stage::Matching, resume.id, &result, started);
            Some(result)
        };
        let questions = async {
            let started = Instant::now();
            let result = self.questions.generate(&profile, cancel).await;
            self.record(Stage::Questions, resume.id, &result, started);
            result
        };
        let (job_match, questions) = tokio::join!(matching, questions);

        let mut errors = Vec::new();
        let job_match = match job_match {
            None => None,
            Some(Ok(report)) => Some(report),
            Some(Err(error)) => {
                settle(Stage::Matching, error, &mut errors)?;
                None
            }
        };
        let questions = match questions {
            Ok(set) => Some(set),
            Err(error) => {
                settle(Stage::Questions, error, &mut errors)?;
                None
            }
        };

        Ok(ResumeReport {
            resume_id: resume.id,
            filename: resume.filename.clone(),
            uploaded_at: resume.uploaded_at,
            processed_at: Utc::now(),
            job_description: job_description.map(str::to_owned),
            status: if errors.is_empty() {
                ReportStatus::Completed
            } else {
                ReportStatus::Degraded
            },
            profile: Some(profile),
            job_match,
            questions,
            errors,
        })
    }

    async fn persist(&self, report: &ResumeReport) -> Result<(), AnalysisError> {
        let started = Instant::now();
        let result = self.store.put(report).await.map_err(AnalysisError::from);
        self.record(Stage::Persistence, report.resume_id, &result, started);
        result
    }

    fn record<T>(
        &self,
        stage: Stage,
        resume_id: Uuid,
        result: &Result<T, AnalysisError>,
        started: Instant,
    ) {
        let outcome = match result {
            Ok(_) => EventOutcome::Succeeded,
            Err(e) => EventOutcome::Failed(e.kind()),
        };
        self.events.emit(PipelineEvent {
            stage,
            resume_id,
            outcome,
            latency: started.elapsed(),
        });
    }

    fn skip(&self, stage: Stage, resume_id: Uuid) {
        self.events.emit(PipelineEvent {
            stage,
            resume_id,
            outcome: EventOutcome::Skipped,
            latency: Default::default(),
        });
    }
}

/// Cancellation aborts the report; any other stage error is recorded on it.
fn settle(
    stage: Stage,
    error: AnalysisError,
    errors: &mut Vec<StageError>,
) -> Result<(), StageFailure> {
    if matches!(error, AnalysisError::Cancelled) {
        return Err(StageFailure { stage, error });
    }
    errors.push(StageError::new(stage, &error));
    Ok(())
}

/// A blank job description means matching is not requested.
fn normalize_jd(job_description: Option<&str>) -> Option<&str> {
    job_description.map(str::trim).filter(|jd| !jd.is_empty())
}
