use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::models::batch::{BatchOutcome, BatchReport};
use crate::pipeline::cancel::CancelSignal;
use crate::routes::resumes::archive;
use crate::routes::upload::read_upload;
use crate::state::AppState;

/// Most resumes accepted in one batch request.
pub const MAX_BATCH_FILES: usize = 50;

/// POST /api/v1/batches
/// Multipart: one or more `files` parts and a required `job_description`.
///
/// Always answers 200 once the batch ran; per-resume failures are reported
/// inside the body.
pub async fn handle_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchReport>, AppError> {
    let form = read_upload(multipart, "files", state.max_upload_bytes).await?;
    let Some(job_description) = form.job_description else {
        return Err(AppError::Validation(
            "A non-empty 'job_description' is required for batch analysis".into(),
        ));
    };
    if form.files.is_empty() {
        return Err(AppError::Validation(
            "At least one 'files' part is required".into(),
        ));
    }
    if form.files.len() > MAX_BATCH_FILES {
        return Err(AppError::Validation(format!(
            "A batch holds at most {MAX_BATCH_FILES} resumes, got {}",
            form.files.len()
        )));
    }

    info!("Received batch of {} resumes", form.files.len());
    let originals = form.files.clone();

    let cancel = CancelSignal::new();
    let guard = cancel.drop_guard();
    let report = state
        .coordinator
        .process_batch(form.files, Some(job_description), &cancel)
        .await;
    guard.disarm();

    for (entry, resume) in report.entries.iter().zip(&originals) {
        if matches!(entry.outcome, BatchOutcome::Report(_)) {
            archive(&state, resume).await;
        }
    }

    Ok(Json(report))
}
