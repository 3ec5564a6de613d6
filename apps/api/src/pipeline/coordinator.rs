//! Batch coordinator: fans a batch of resumes out over a bounded worker pool.
//!
//! Each resume gets its own task. A task first waits for a worker slot (or for
//! cancellation), then runs the whole per-resume pipeline while holding it.
//! Results land in a slot indexed by input position, so the batch report keeps
//! input order no matter which resume finishes first.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::ErrorKind;
use crate::models::batch::{BatchEntry, BatchOutcome, BatchReport, FailureMarker};
use crate::models::report::{RawResume, Stage};
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::ResumePipeline;

pub struct BatchCoordinator {
    pipeline: Arc<ResumePipeline>,
    workers: Arc<Semaphore>,
}

impl BatchCoordinator {
    pub fn new(pipeline: Arc<ResumePipeline>, max_workers: usize) -> Self {
        Self {
            pipeline,
            workers: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    /// Always returns a report with exactly one entry per input resume.
    pub async fn process_batch(
        &self,
        resumes: Vec<RawResume>,
        job_description: Option<String>,
        cancel: &CancelSignal,
    ) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let job_description: Option<Arc<str>> = job_description.map(Arc::from);
        info!(
            "Batch {batch_id}: processing {} resumes (job description: {})",
            resumes.len(),
            job_description.is_some()
        );

        let identities: Vec<(Uuid, String)> = resumes
            .iter()
            .map(|r| (r.id, r.filename.clone()))
            .collect();
        let mut slots: Vec<Option<BatchEntry>> = identities.iter().map(|_| None).collect();

        let mut tasks = JoinSet::new();
        for (index, resume) in resumes.into_iter().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            let workers = Arc::clone(&self.workers);
            let job_description = job_description.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = workers.acquire_owned() => permit.ok(),
                };
                // A slot freed at the moment of cancellation must not start work.
                let outcome = match permit {
                    Some(_permit) if !cancel.is_cancelled() => {
                        pipeline
                            .run(&resume, job_description.as_deref(), &cancel)
                            .await
                    }
                    _ => BatchOutcome::Failed(FailureMarker::cancelled(Stage::Queued)),
                };
                (
                    index,
                    BatchEntry {
                        resume_id: resume.id,
                        filename: resume.filename,
                        outcome,
                    },
                )
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entry)) => slots[index] = Some(entry),
                Err(e) => error!("Batch {batch_id}: resume task aborted: {e}"),
            }
        }

        let entries: Vec<BatchEntry> = slots
            .into_iter()
            .zip(identities)
            .map(|(slot, (resume_id, filename))| {
                slot.unwrap_or_else(|| BatchEntry {
                    resume_id,
                    filename,
                    outcome: BatchOutcome::Failed(FailureMarker {
                        stage: Stage::Queued,
                        kind: ErrorKind::Internal,
                        message: "resume task aborted".to_string(),
                    }),
                })
            })
            .collect();

        let report = BatchReport::new(batch_id, entries);
        info!(
            "Batch {batch_id}: finished with status {:?} ({} succeeded, {} degraded, {} failed, {} cancelled)",
            report.status,
            report.summary.succeeded,
            report.summary.degraded,
            report.summary.failed,
            report.summary.cancelled
        );
        report
    }
}
