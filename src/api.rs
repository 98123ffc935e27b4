//! HTTP surface for the document summarizer.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `GET /` – Health check with a machine-readable route map.
//! - `POST /summarize` – Run the full pipeline for a Drive folder and return per-file results.
//! - `GET /summarize/download/csv` – Export the most recently completed run as CSV.
//! - `GET /drive/files` – List candidate files without downloading or summarizing.
//! - `GET /drive/connect` – Verify the Drive credential setup.
//!
//! Handlers are generic over [`SummarizeApi`] so tests can drive the router with a stub
//! service. The CSV export reads the last run from shared router state; it is a
//! single-operator convenience, never used for correctness.

use crate::auth::AuthError;
use crate::config::get_config;
use crate::drive::{DriveError, FileDescriptor};
use crate::pipeline::{PipelineError, ProcessingResult, SummarizeApi};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared router state: the pipeline service plus the last completed run.
pub struct AppState<S> {
    service: Arc<S>,
    last_results: Mutex<Vec<ProcessingResult>>,
}

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SummarizeApi + 'static,
{
    let state = Arc::new(AppState {
        service,
        last_results: Mutex::new(Vec::new()),
    });
    Router::new()
        .route("/", get(health))
        .route("/summarize", post(run_summarize::<S>))
        .route("/summarize/download/csv", get(download_csv::<S>))
        .route("/drive/files", get(list_drive_files::<S>))
        .route("/drive/connect", get(drive_connect::<S>))
        .with_state(state)
}

/// Health payload with a route map for quick discovery.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Document Summarizer API is running.",
        "routes": {
            "drive_connect": "GET  /drive/connect",
            "drive_files": "GET  /drive/files?folder_id=<id>",
            "summarize": "POST /summarize",
            "summarize_csv": "GET  /summarize/download/csv"
        }
    }))
}

/// Request body for the `POST /summarize` endpoint.
#[derive(Debug, Default, Deserialize)]
struct SummarizeRequest {
    /// Drive folder to process (defaults to `DRIVE_FOLDER_ID`).
    #[serde(default)]
    folder_id: Option<String>,
    /// Local staging directory override (defaults to `DOWNLOAD_DIR`).
    #[serde(default)]
    download_dir: Option<String>,
}

/// Response body for the `POST /summarize` endpoint.
#[derive(Debug, Serialize)]
struct SummarizeResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder_id: Option<String>,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_count: Option<usize>,
    results: Vec<ProcessingResult>,
}

/// Run the full pipeline for one folder and record the results for CSV export.
///
/// An empty folder is success with zero results; only a run-level fetch failure is an error.
async fn run_summarize<S>(
    State(state): State<Arc<AppState<S>>>,
    body: Option<Json<SummarizeRequest>>,
) -> Result<Json<SummarizeResponse>, ApiError>
where
    S: SummarizeApi,
{
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let config = get_config();
    let folder_id = request
        .folder_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| config.drive_folder_id.clone())
        .ok_or(ApiError::MissingFolderId)?;
    let download_dir = request
        .download_dir
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| config.download_dir.clone());

    tracing::info!(folder = %folder_id, "Starting pipeline run");
    let results = state
        .service
        .run_pipeline(&folder_id, &download_dir)
        .await?;
    *state.last_results.lock().await = results.clone();

    if results.is_empty() {
        return Ok(Json(SummarizeResponse {
            status: "success",
            message: Some("No supported files found in the specified folder.".to_string()),
            folder_id: None,
            total: 0,
            success_count: None,
            failed_count: None,
            results,
        }));
    }

    let success_count = results.iter().filter(|r| r.is_success()).count();
    let failed_count = results.len() - success_count;
    tracing::info!(
        folder = %folder_id,
        success = success_count,
        failed = failed_count,
        "Pipeline run completed"
    );
    Ok(Json(SummarizeResponse {
        status: "success",
        message: None,
        folder_id: Some(folder_id),
        total: results.len(),
        success_count: Some(success_count),
        failed_count: Some(failed_count),
        results,
    }))
}

/// Export the most recently completed run as CSV.
async fn download_csv<S>(State(state): State<Arc<AppState<S>>>) -> Result<Response, ApiError>
where
    S: SummarizeApi,
{
    let results = state.last_results.lock().await.clone();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["File Name", "Status", "Summary"])
        .map_err(|error| ApiError::Csv(error.to_string()))?;
    for result in &results {
        let summary = if result.summary.is_empty() {
            result.error.as_deref().unwrap_or_default()
        } else {
            result.summary.as_str()
        };
        writer
            .write_record([result.file_name.as_str(), result.status.as_str(), summary])
            .map_err(|error| ApiError::Csv(error.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|error| ApiError::Csv(error.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"summaries.csv\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Query parameters for `GET /drive/files`.
#[derive(Debug, Deserialize)]
struct ListFilesQuery {
    #[serde(default)]
    folder_id: Option<String>,
}

/// Response body for `GET /drive/files`.
#[derive(Debug, Serialize)]
struct FilesResponse {
    status: &'static str,
    folder_id: String,
    total: usize,
    files: Vec<FileDescriptor>,
}

/// List supported files in a folder without downloading them.
async fn list_drive_files<S>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<FilesResponse>, ApiError>
where
    S: SummarizeApi,
{
    let folder_id = query
        .folder_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| get_config().drive_folder_id.clone())
        .ok_or(ApiError::MissingFolderId)?;

    let files = state.service.list_files(&folder_id).await?;
    Ok(Json(FilesResponse {
        status: "success",
        folder_id,
        total: files.len(),
        files,
    }))
}

/// Verify the Drive credential setup end to end.
async fn drive_connect<S>(State(state): State<Arc<AppState<S>>>) -> Result<Json<serde_json::Value>, ApiError>
where
    S: SummarizeApi,
{
    state.service.check_drive().await?;
    tracing::info!("Google Drive connected successfully");
    Ok(Json(json!({
        "status": "connected",
        "message": "Google Drive connected successfully."
    })))
}

/// Errors surfaced by the HTTP layer, mapped to status codes.
enum ApiError {
    MissingFolderId,
    Pipeline(PipelineError),
    Drive(DriveError),
    Csv(String),
}

impl From<PipelineError> for ApiError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

impl From<DriveError> for ApiError {
    fn from(inner: DriveError) -> Self {
        Self::Drive(inner)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::MissingFolderId => (
                StatusCode::BAD_REQUEST,
                "Folder ID not provided and not set in config.".to_string(),
            ),
            Self::Pipeline(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Pipeline failed: {error}"),
            ),
            Self::Drive(DriveError::Auth(
                error @ (AuthError::MissingCredentials(_) | AuthError::MissingToken(_)),
            )) => (StatusCode::NOT_FOUND, error.to_string()),
            Self::Drive(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
            Self::Csv(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("CSV export failed: {error}"),
            ),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONFIG, Config};
    use crate::pipeline::ResultStatus;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use std::path::Path;
    use std::sync::Once;
    use tower::ServiceExt;

    fn ensure_test_config() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = CONFIG.set(Config {
                openai_api_key: "sk-test".into(),
                openai_model: "gpt-4o-mini".into(),
                openai_max_tokens: 256,
                openai_temperature: 0.4,
                google_credentials_path: "credentials/credentials.json".into(),
                google_token_path: "credentials/token.json".into(),
                drive_folder_id: None,
                download_dir: "downloads-default".into(),
                server_port: None,
            });
        });
    }

    fn success_result(name: &str) -> ProcessingResult {
        ProcessingResult {
            file_name: name.to_string(),
            status: ResultStatus::Success,
            summary: format!("summary of {name}"),
            error: None,
        }
    }

    fn error_result(name: &str, detail: &str) -> ProcessingResult {
        ProcessingResult {
            file_name: name.to_string(),
            status: ResultStatus::Error,
            summary: "Processing failed.".to_string(),
            error: Some(detail.to_string()),
        }
    }

    #[derive(Clone, Debug)]
    struct RunCall {
        folder_id: String,
        download_dir: PathBuf,
    }

    struct StubService {
        results: Vec<ProcessingResult>,
        files: Vec<FileDescriptor>,
        credentials_missing: bool,
        calls: Mutex<Vec<RunCall>>,
    }

    impl StubService {
        fn with_results(results: Vec<ProcessingResult>) -> Self {
            Self {
                results,
                files: Vec::new(),
                credentials_missing: false,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SummarizeApi for StubService {
        async fn run_pipeline(
            &self,
            folder_id: &str,
            download_dir: &Path,
        ) -> Result<Vec<ProcessingResult>, PipelineError> {
            self.calls.lock().await.push(RunCall {
                folder_id: folder_id.to_string(),
                download_dir: download_dir.to_path_buf(),
            });
            if folder_id == "bad-folder" {
                return Err(PipelineError::Fetch(DriveError::Api {
                    status: 404,
                    message: "folder not found".into(),
                }));
            }
            Ok(self.results.clone())
        }

        async fn list_files(&self, _folder_id: &str) -> Result<Vec<FileDescriptor>, DriveError> {
            Ok(self.files.clone())
        }

        async fn check_drive(&self) -> Result<(), DriveError> {
            if self.credentials_missing {
                return Err(DriveError::Auth(AuthError::MissingCredentials(
                    "credentials/credentials.json".into(),
                )));
            }
            Ok(())
        }
    }

    fn post_summarize(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/summarize")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn summarize_reports_counts_and_results_in_order() {
        ensure_test_config();
        let service = Arc::new(StubService::with_results(vec![
            success_result("A.pdf"),
            error_result("B.docx", "no extractable text"),
            error_result("C.txt", "request timed out"),
        ]));
        let app = create_router(service.clone());

        let response = app
            .oneshot(post_summarize(json!({"folder_id": "folder-1"})))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["folder_id"], "folder-1");
        assert_eq!(body["total"], 3);
        assert_eq!(body["success_count"], 1);
        assert_eq!(body["failed_count"], 2);
        assert_eq!(body["results"][0]["file_name"], "A.pdf");
        assert_eq!(body["results"][1]["status"], "error");
        assert_eq!(body["results"][2]["error"], "request timed out");

        let calls = service.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].folder_id, "folder-1");
        // Staging directory falls back to the configured default.
        assert_eq!(calls[0].download_dir, PathBuf::from("downloads-default"));
    }

    #[tokio::test]
    async fn summarize_empty_folder_returns_zero_results() {
        ensure_test_config();
        let service = Arc::new(StubService::with_results(Vec::new()));
        let app = create_router(service);

        let response = app
            .oneshot(post_summarize(json!({"folder_id": "empty-folder"})))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["total"], 0);
        assert_eq!(body["results"], json!([]));
        assert!(body["message"].as_str().expect("message").contains("No supported files"));
        assert!(body.get("success_count").is_none());
    }

    #[tokio::test]
    async fn summarize_without_folder_id_is_rejected() {
        ensure_test_config();
        let service = Arc::new(StubService::with_results(Vec::new()));
        let app = create_router(service);

        let response = app
            .oneshot(post_summarize(json!({})))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert!(body["detail"].as_str().expect("detail").contains("Folder ID"));
    }

    #[tokio::test]
    async fn summarize_run_failure_maps_to_server_error() {
        ensure_test_config();
        let service = Arc::new(StubService::with_results(Vec::new()));
        let app = create_router(service);

        let response = app
            .oneshot(post_summarize(json!({"folder_id": "bad-folder"})))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert!(body["detail"].as_str().expect("detail").contains("Pipeline failed"));
    }

    #[tokio::test]
    async fn csv_export_reflects_the_last_completed_run() {
        ensure_test_config();
        let service = Arc::new(StubService::with_results(vec![
            success_result("A.pdf"),
            error_result("B.docx", "no extractable text"),
        ]));
        let app = create_router(service);

        let run = app
            .clone()
            .oneshot(post_summarize(json!({"folder_id": "folder-1"})))
            .await
            .expect("run response");
        assert_eq!(run.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/summarize/download/csv")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("csv response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .expect("content type"),
            "text/csv"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let csv_text = String::from_utf8(bytes.to_vec()).expect("utf8 csv");
        let mut lines = csv_text.lines();
        assert_eq!(lines.next(), Some("File Name,Status,Summary"));
        assert_eq!(lines.next(), Some("A.pdf,success,summary of A.pdf"));
        assert_eq!(lines.next(), Some("B.docx,error,Processing failed."));
    }

    #[tokio::test]
    async fn csv_export_before_any_run_is_header_only() {
        ensure_test_config();
        let service = Arc::new(StubService::with_results(Vec::new()));
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/summarize/download/csv")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("csv response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        assert_eq!(
            String::from_utf8(bytes.to_vec()).expect("utf8 csv").trim(),
            "File Name,Status,Summary"
        );
    }

    #[tokio::test]
    async fn drive_files_lists_candidates_without_downloading() {
        ensure_test_config();
        let mut service = StubService::with_results(Vec::new());
        service.files = vec![FileDescriptor {
            id: "f1".into(),
            name: "A.pdf".into(),
            mime_type: "application/pdf".into(),
            extension: ".pdf".into(),
            local_path: None,
        }];
        let app = create_router(Arc::new(service));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/drive/files?folder_id=folder-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["files"][0]["name"], "A.pdf");
        assert_eq!(body["files"][0]["mimeType"], "application/pdf");
        assert!(body["files"][0].get("local_path").is_none());
    }

    #[tokio::test]
    async fn drive_connect_maps_missing_credentials_to_not_found() {
        ensure_test_config();
        let mut service = StubService::with_results(Vec::new());
        service.credentials_missing = true;
        let app = create_router(Arc::new(service));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/drive/connect")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json_body(response).await;
        assert!(body["detail"].as_str().expect("detail").contains("credentials"));
    }

    #[tokio::test]
    async fn health_lists_routes() {
        let response = health().await;
        let body = response.0;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["routes"]["summarize"], "POST /summarize");
    }
}
