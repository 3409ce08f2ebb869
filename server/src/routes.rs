//! HTTP routes

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use fincrew::{write_upload, ArtifactGuard, Job};

use crate::app::AppState;
use crate::error::ApiError;

/// Uploads above this size are rejected by the multipart extractor.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    router_with_upload_limit(state, MAX_UPLOAD_BYTES)
}

fn router_with_upload_limit(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/analyze", post(analyze))
        .route("/analyses", get(list_analyses))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Accepted {
    status: &'static str,
    message: &'static str,
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Financial Document Analyzer API is running" }))
}

/// Checks the client-supplied name, case-insensitively.
fn is_pdf_filename(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

/// Accepts a `file` part and an optional `query` part, writes the upload to
/// disk and queues a job. The response does not wait for the analysis.
async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Accepted>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    upload = Some((filename, data.to_vec()));
                }
            }
            Some("query") => query = Some(field.text().await?),
            _ => {}
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded.".to_string()))?;
    if !is_pdf_filename(&filename) {
        return Err(ApiError::BadRequest(
            "Only PDF documents supported.".to_string(),
        ));
    }
    if state.pool.is_shutdown() {
        return Err(ApiError::Unavailable(
            "Server is shutting down; not accepting new documents.".to_string(),
        ));
    }

    // Disk write and a possibly full queue both block.
    let job_id = tokio::task::spawn_blocking(move || -> Result<String, ApiError> {
        let path = write_upload(&state.data_directory, &data)?;
        let job = Job::with_default_query(
            path.clone(),
            filename,
            query.as_deref(),
            &state.default_query,
        );
        let job_id = job.id.clone();

        if let Err(e) = state.pool.submit(job) {
            ArtifactGuard::new(path).release();
            return Err(ApiError::Unavailable(format!(
                "Worker pool is not accepting jobs: {}",
                e
            )));
        }
        Ok(job_id)
    })
    .await??;

    info!(job_id = %job_id, "Document accepted for analysis");

    Ok(Json(Accepted {
        status: "processing",
        message: "Analysis started in background. Check /analyses endpoint for results.",
    }))
}

/// Every stored analysis, oldest first, as `[id, filename, query, result]`.
async fn list_analyses(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    let records = tokio::task::spawn_blocking(move || store.list_all()).await??;

    let rows: Vec<Value> = records
        .into_iter()
        .map(|r| json!([r.id, r.filename, r.query, r.result]))
        .collect();

    Ok(Json(json!({ "analyses": rows })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use fincrew::completion::{CompletionClient, CompletionError, CompletionRequest};
    use fincrew::pipeline::{PipelineConfig, Stage};
    use fincrew::{
        ExtractError, JobRunner, Pipeline, ResultStore, SqliteResultStore, TextSource,
        WorkerPool,
    };

    const BOUNDARY: &str = "fincrew-test-boundary";

    struct Fixed;

    impl TextSource for Fixed {
        fn extract(&self, path: &Path) -> Result<String, ExtractError> {
            if path.exists() {
                Ok("Revenue: $10M, Net income: $2M".to_string())
            } else {
                Err(ExtractError::NotFound(path.to_path_buf()))
            }
        }
    }

    struct Advisor;

    impl CompletionClient for Advisor {
        fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            Ok("Final Recommendation: HOLD\nRevenue is flat.".to_string())
        }
    }

    fn test_state(dir: &TempDir) -> AppState {
        let config = PipelineConfig::new(vec![
            Stage::new("analysis", "Analyze {document_text}"),
            Stage::new("recommendation", "Answer {query}").depends_on(["analysis"]),
        ]);
        let pipeline = Pipeline::new(&config, Arc::new(Advisor)).unwrap();
        let store: Arc<dyn ResultStore> = Arc::new(SqliteResultStore::open_in_memory().unwrap());
        let runner = JobRunner::new(Arc::new(Fixed), Arc::new(pipeline), Arc::clone(&store));

        AppState {
            pool: Arc::new(WorkerPool::new(Arc::new(runner), 1).unwrap()),
            store,
            data_directory: dir.path().join("data"),
            default_query: fincrew::worker::DEFAULT_QUERY.to_string(),
        }
    }

    fn multipart_body(file: Option<(&str, &[u8])>, query: Option<&str>) -> Body {
        let mut body = Vec::new();
        if let Some((name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, name
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(q) = query {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"query\"\r\n\r\n{}\r\n",
                    BOUNDARY, q
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Body::from(body)
    }

    fn analyze_request(body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(body)
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn uploads(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path().join("data"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_is_pdf_filename() {
        assert!(is_pdf_filename("q1.pdf"));
        assert!(is_pdf_filename("REPORT.PDF"));
        assert!(!is_pdf_filename("notes.txt"));
        assert!(!is_pdf_filename("pdf"));
    }

    #[tokio::test]
    async fn test_root() {
        let dir = TempDir::new().unwrap();
        let app = router(test_state(&dir));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["message"],
            "Financial Document Analyzer API is running"
        );
    }

    #[tokio::test]
    async fn test_non_pdf_rejected_without_scheduling() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let app = router(state.clone());

        let response = app
            .oneshot(analyze_request(multipart_body(
                Some(("notes.txt", b"hello")),
                None,
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["detail"], "Only PDF documents supported.");
        assert_eq!(uploads(&dir), 0);
        assert!(state.store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let app = router_with_upload_limit(state.clone(), 1024);
        let big = vec![b'x'; 8 * 1024];

        let response = app
            .oneshot(analyze_request(multipart_body(Some(("big.pdf", big.as_slice())), None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(json_body(response).await["detail"]
            .as_str()
            .unwrap()
            .starts_with("Invalid upload"));
        assert_eq!(uploads(&dir), 0);
        assert!(state.store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_rejected() {
        let dir = TempDir::new().unwrap();
        let app = router(test_state(&dir));

        let response = app
            .oneshot(analyze_request(multipart_body(None, Some("Should I invest?"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["detail"], "No file uploaded.");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pdf_accepted_and_analyzed_in_background() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let app = router(state.clone());

        let response = app
            .oneshot(analyze_request(multipart_body(
                Some(("Q1.PDF", b"%PDF-1.5 fake")),
                Some("  Should I invest?  "),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "processing");
        assert_eq!(
            body["message"],
            "Analysis started in background. Check /analyses endpoint for results."
        );

        let pool = Arc::clone(&state.pool);
        let result = tokio::task::spawn_blocking(move || pool.recv_result())
            .await
            .unwrap()
            .unwrap();
        assert!(result.success, "job failed: {:?}", result.error);
        assert_eq!(uploads(&dir), 0, "artifact must be deleted");

        let response = router(state)
            .oneshot(Request::builder().uri("/analyses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        let row = &body["analyses"][0];
        assert_eq!(row[1], "Q1.PDF");
        assert_eq!(row[2], "Should I invest?");
        assert!(row[3].as_str().unwrap().starts_with("Final Recommendation: HOLD"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blank_query_uses_default() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        router(state.clone())
            .oneshot(analyze_request(multipart_body(
                Some(("q1.pdf", b"%PDF")),
                Some("   "),
            )))
            .await
            .unwrap();

        let pool = Arc::clone(&state.pool);
        tokio::task::spawn_blocking(move || pool.recv_result())
            .await
            .unwrap()
            .unwrap();

        let records = state.store.list_all().unwrap();
        assert_eq!(
            records[0].query,
            "Analyze this financial document for investment insights"
        );
    }

    #[tokio::test]
    async fn test_shut_down_pool_returns_503() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        state.pool.shutdown();

        let response = router(state)
            .oneshot(analyze_request(multipart_body(Some(("q1.pdf", b"%PDF")), None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(uploads(&dir), 0);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let dir = TempDir::new().unwrap();

        let response = router(test_state(&dir))
            .oneshot(Request::builder().uri("/analyses").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "analyses": [] }));
    }
}
