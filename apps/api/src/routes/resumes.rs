use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::report::{RawResume, ReportStatus, ReportStatusView, ResumeReport};
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::hiring_report::render_hiring_report;
use crate::routes::upload::read_upload;
use crate::state::AppState;
use crate::store::{ListFilter, ReportSummary};

/// POST /api/v1/resumes
/// Multipart: `file` (PDF, required), `job_description` (optional).
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeReport>), AppError> {
    let form = read_upload(multipart, "file", state.max_upload_bytes).await?;
    let mut files = form.files.into_iter();
    let resume = match (files.next(), files.next()) {
        (Some(resume), None) => resume,
        (None, _) => return Err(AppError::Validation("A 'file' part is required".into())),
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "Exactly one 'file' part is allowed; use /api/v1/batches for several".into(),
            ))
        }
    };

    info!("Analyzing resume {} ({})", resume.id, resume.filename);
    let cancel = CancelSignal::new();
    let guard = cancel.drop_guard();
    let report = state
        .pipeline
        .analyze(&resume, form.job_description.as_deref(), &cancel)
        .await?;
    guard.disarm();

    archive(&state, &resume).await;
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/v1/resumes?status=&limit=
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ReportSummary>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ReportStatus>)
        .transpose()
        .map_err(AppError::Validation)?;
    let rows = state
        .store()
        .list(ListFilter::new(status, query.limit))
        .await?;
    Ok(Json(rows))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeReport>, AppError> {
    Ok(Json(state.store().get(id).await?))
}

/// GET /api/v1/resumes/:id/status
pub async fn handle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportStatusView>, AppError> {
    let report = state.store().get(id).await?;
    Ok(Json(report.status_view()))
}

#[derive(Debug, Default, Deserialize)]
pub struct HiringReportRequest {
    pub job_title: Option<String>,
}

/// POST /api/v1/resumes/:id/report
/// Returns the stored match analysis as a markdown hiring report.
pub async fn handle_hiring_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<HiringReportRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let report = state.store().get(id).await?;
    let markdown =
        render_hiring_report(&report, request.job_title.as_deref().unwrap_or_default())
            .ok_or_else(|| {
                AppError::UnprocessableEntity(format!(
                    "Resume {id} has no job match analysis; upload it with a job description"
                ))
            })?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        markdown,
    ))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub resume_id: Uuid,
    pub deleted: bool,
    /// Archived objects removed; 0 when archival is off or storage failed.
    pub files_removed: usize,
}

/// DELETE /api/v1/resumes/:id
/// Removes the stored report, then the archived PDF. Storage errors after the
/// report is gone are logged, not returned.
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.store().delete(id).await?;
    info!("Deleted report for resume {id}");

    let files_removed = match state.archive.delete(id).await {
        Ok(removed) => removed,
        Err(e) => {
            warn!("Failed to delete archived files for resume {id}: {e:#}");
            0
        }
    };

    Ok(Json(DeleteResponse {
        resume_id: id,
        deleted: true,
        files_removed,
    }))
}

/// Archival runs after the report is stored; failures are logged only.
pub(crate) async fn archive(state: &AppState, resume: &RawResume) {
    if let Err(e) = state.archive.archive(resume).await {
        warn!("Failed to archive resume {}: {e:#}", resume.id);
    }
}
