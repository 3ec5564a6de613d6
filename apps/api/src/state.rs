use std::sync::Arc;

use crate::pipeline::{BatchCoordinator, ResumePipeline};
use crate::store::{ResultStore, ResumeArchive};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ResumePipeline>,
    pub coordinator: Arc<BatchCoordinator>,
    /// Raw PDF archive. A no-op when S3 is not configured.
    pub archive: Arc<dyn ResumeArchive>,
    /// Per-file ceiling enforced at the boundary, before the core sees the bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        self.pipeline.store()
    }
}
