use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::errors::AppError;
use crate::models::report::RawResume;

/// Parsed multipart upload.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<RawResume>,
    pub job_description: Option<String>,
}

/// Reads every part of `multipart`. Parts named `file_field` are PDFs; a
/// `job_description` text part is optional. Unknown parts are ignored.
pub async fn read_upload(
    mut multipart: Multipart,
    file_field: &str,
    max_file_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        if name == "job_description" {
            let text = field.text().await.map_err(multipart_error)?;
            let text = text.trim();
            if !text.is_empty() {
                form.job_description = Some(text.to_string());
            }
        } else if name == file_field {
            let filename = field.file_name().unwrap_or("resume.pdf").to_string();
            let content_type = field.content_type().map(str::to_owned);
            if !is_pdf(&filename, content_type.as_deref()) {
                return Err(AppError::Validation(format!(
                    "'{filename}' is not a PDF; only PDF resumes are accepted"
                )));
            }
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if bytes.len() > max_file_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "'{filename}' is {} bytes; the limit is {max_file_bytes}",
                    bytes.len()
                )));
            }
            form.files.push(RawResume::new(filename, bytes));
        }
    }

    Ok(form)
}

fn is_pdf(filename: &str, content_type: Option<&str>) -> bool {
    filename.to_lowercase().ends_with(".pdf") || content_type == Some("application/pdf")
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}
