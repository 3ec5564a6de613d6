pub mod batches;
pub mod health;
pub mod resumes;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Room for multipart boundaries and the job description on top of the file bytes.
const MULTIPART_OVERHEAD: usize = 256 * 1024;

pub fn build_router(state: AppState) -> Router {
    let single_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    let batch_limit = state
        .max_upload_bytes
        .saturating_mul(batches::MAX_BATCH_FILES)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes",
            post(resumes::handle_upload)
                .get(resumes::handle_list)
                .layer(DefaultBodyLimit::max(single_limit)),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get).delete(resumes::handle_delete),
        )
        .route("/api/v1/resumes/:id/status", get(resumes::handle_status))
        .route(
            "/api/v1/resumes/:id/report",
            post(resumes::handle_hiring_report),
        )
        .route(
            "/api/v1/batches",
            post(batches::handle_batch).layer(DefaultBodyLimit::max(batch_limit)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::pipeline::BatchCoordinator;
    use crate::store::{InMemoryResultStore, NoopArchive, ResumeArchive};
    use crate::testing::{pipeline_with, FailingArchive, RecordingSink, RoutingBackend};

    const BOUNDARY: &str = "X-RESUME-BOUNDARY";
    const JD: &str = "Senior Rust engineer, PostgreSQL";

    fn app() -> Router {
        app_with_archive(Arc::new(NoopArchive))
    }

    fn app_with_archive(archive: Arc<dyn ResumeArchive>) -> Router {
        let pipeline = Arc::new(pipeline_with(
            RoutingBackend::healthy(),
            Arc::new(InMemoryResultStore::new()),
            Arc::new(RecordingSink::default()),
        ));
        let coordinator = Arc::new(BatchCoordinator::new(Arc::clone(&pipeline), 2));
        build_router(AppState {
            pipeline,
            coordinator,
            archive,
            max_upload_bytes: 1024,
        })
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::delete(uri).body(Body::empty()).unwrap()
    }

    async fn upload(app: &Router) -> String {
        let (status, report) = send(
            app,
            multipart(
                "/api/v1/resumes",
                &[Part::File("file", "ada.pdf", "Ada Lovelace, Rust")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        report["resume_id"].as_str().unwrap().to_string()
    }

    enum Part<'a> {
        File(&'a str, &'a str, &'a str),
        Text(&'a str, &'a str),
    }

    fn multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match part {
                Part::File(name, filename, content) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n{content}\r\n"
                )),
                Part::Text(name, value) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )),
            }
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_then_read_back() {
        let app = app();
        let (status, report) = send(
            &app,
            multipart(
                "/api/v1/resumes",
                &[
                    Part::File("file", "ada.pdf", "Ada Lovelace, Rust"),
                    Part::Text("job_description", JD),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(report["status"], "completed");
        assert_eq!(report["job_match"]["score"], 82);
        let id = report["resume_id"].as_str().unwrap().to_string();

        let (status, stored) = send(&app, get(&format!("/api/v1/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["filename"], "ada.pdf");

        let (status, view) = send(&app, get(&format!("/api/v1/resumes/{id}/status"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["status"], "completed");
        assert!(view.get("profile").is_none());

        let (status, rows) = send(&app, get("/api/v1/resumes?status=completed")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rows.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_hiring_report_is_markdown() {
        let app = app();
        let (_, report) = send(
            &app,
            multipart(
                "/api/v1/resumes",
                &[
                    Part::File("file", "ada.pdf", "Ada Lovelace, Rust"),
                    Part::Text("job_description", JD),
                ],
            ),
        )
        .await;
        let id = report["resume_id"].as_str().unwrap();

        let request = Request::post(format!("/api/v1/resumes/{id}/report"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"job_title":"Storage Engineer"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/markdown"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let markdown = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(markdown.contains("Storage Engineer"));
        assert!(markdown.contains("Key Strengths"));
    }

    #[tokio::test]
    async fn test_hiring_report_without_match_is_unprocessable() {
        let app = app();
        let (status, report) = send(
            &app,
            multipart(
                "/api/v1/resumes",
                &[Part::File("file", "ada.pdf", "Ada Lovelace, Rust")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(report["job_match"].is_null());
        let id = report["resume_id"].as_str().unwrap();

        let request = Request::post(format!("/api/v1/resumes/{id}/report"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let app = app();

        let (status, body) = send(
            &app,
            multipart(
                "/api/v1/resumes",
                &[Part::Text("job_description", JD)],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let not_pdf = Request::post("/api/v1/resumes")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"cv.docx\"\r\nContent-Type: application/msword\r\n\r\nhello\r\n\
                 --{BOUNDARY}--\r\n"
            )))
            .unwrap();
        let (status, _) = send(&app, not_pdf).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let big = "x".repeat(2048);
        let (status, body) = send(
            &app,
            multipart("/api/v1/resumes", &[Part::File("file", "big.pdf", &big)]),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

        let (status, _) = send(
            &app,
            multipart(
                "/api/v1/resumes",
                &[Part::File("file", "locked.pdf", "BROKEN encrypted")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (_, rows) = send(&app, get("/api/v1/resumes")).await;
        assert_eq!(rows.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_lookup_errors() {
        let app = app();
        let (status, body) = send(
            &app,
            get("/api/v1/resumes/5f0c7c1e-8a55-4c1b-9d2e-3a4b5c6d7e8f"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&app, get("/api/v1/resumes?status=pending")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_removes_report() {
        let app = app();
        let id = upload(&app).await;

        let (status, body) = send(&app, delete(&format!("/api/v1/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], true);
        assert_eq!(body["resume_id"], id.as_str());

        let (status, _) = send(&app, get(&format!("/api/v1/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = send(&app, delete(&format!("/api/v1/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_archive_failures_are_not_surfaced() {
        let app = app_with_archive(Arc::new(FailingArchive));
        let id = upload(&app).await;

        let (status, body) = send(&app, delete(&format!("/api/v1/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["files_removed"], 0);
        let (status, _) = send(&app, get(&format!("/api/v1/resumes/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_requires_job_description() {
        let (status, body) = send(
            &app(),
            multipart(
                "/api/v1/batches",
                &[Part::File("files", "a.pdf", "Ada Lovelace")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_batch_reports_each_resume() {
        let app = app();
        let (status, batch) = send(
            &app,
            multipart(
                "/api/v1/batches",
                &[
                    Part::Text("job_description", JD),
                    Part::File("files", "a.pdf", "Ada Lovelace"),
                    Part::File("files", "b.pdf", "BROKEN scan"),
                    Part::File("files", "c.pdf", "Charles Babbage"),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(batch["status"], "partial");
        let entries = batch["entries"].as_array().unwrap();
        let names: Vec<&str> = entries
            .iter()
            .map(|e| e["filename"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(batch["summary"]["succeeded"], 2);
        assert_eq!(batch["summary"]["failed"], 1);

        // The extraction failure is stored like any other report.
        let (_, rows) = send(&app, get("/api/v1/resumes?status=extraction_failed")).await;
        assert_eq!(rows.as_array().map(Vec::len), Some(1));
    }
}
