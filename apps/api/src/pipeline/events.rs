use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::ErrorKind;
use crate::models::report::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "kind", rename_all = "snake_case")]
pub enum EventOutcome {
    Succeeded,
    /// Stage not requested, e.g. matching without a job description.
    Skipped,
    Failed(ErrorKind),
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Succeeded => "succeeded",
            EventOutcome::Skipped => "skipped",
            EventOutcome::Failed(_) => "failed",
        }
    }
}

/// One structured observation about a pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineEvent {
    pub stage: Stage,
    pub resume_id: Uuid,
    pub outcome: EventOutcome,
    pub latency: Duration,
}

/// Where pipeline events go. The core emits, the sink decides format and destination.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Writes events as structured `tracing` records.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        let latency_ms = event.latency.as_millis() as u64;
        match event.outcome {
            EventOutcome::Failed(kind) => warn!(
                stage = event.stage.as_str(),
                resume_id = %event.resume_id,
                outcome = event.outcome.as_str(),
                error_kind = ?kind,
                latency_ms,
                "pipeline stage failed"
            ),
            outcome => info!(
                stage = event.stage.as_str(),
                resume_id = %event.resume_id,
                outcome = outcome.as_str(),
                latency_ms,
                "pipeline stage finished"
            ),
        }
    }
}
