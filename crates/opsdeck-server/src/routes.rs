//! HTTP routes for the server.
//!
//! Two logical surfaces: `/file` for live file content and `/snapshots`
//! for version history. Snapshot failures never block the file surface.

use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use opsdeck_files::{FileContent, FilesError};
use opsdeck_snapshot::{Snapshot, SnapshotError};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/file", get(file_get).post(file_post))
        .route(
            "/snapshots",
            get(snapshots_list)
                .post(snapshots_create)
                .delete(snapshots_delete),
        )
        .route("/snapshots/lock", post(snapshots_toggle_lock))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
    code: String,
}

impl ApiError {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }

    fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::BAD_REQUEST, Json(Self::new(msg, "BAD_REQUEST")))
    }
}

/// Map a file access error to a response.
///
/// Messages are rebuilt around the client-supplied path so the resolved
/// server-side path never leaks into a response body.
fn files_error_response(err: FilesError, requested: &str) -> (StatusCode, Json<ApiError>) {
    match err {
        FilesError::AccessDenied(_) => (
            StatusCode::FORBIDDEN,
            Json(ApiError::new(
                format!("Access denied: {requested}"),
                "ACCESS_DENIED",
            )),
        ),
        FilesError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                format!("File not found: {requested}"),
                "NOT_FOUND",
            )),
        ),
        FilesError::IsDirectory(_) => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                format!("Not a file: {requested}"),
                "IS_DIRECTORY",
            )),
        ),
        FilesError::NotWritable(_) => (
            StatusCode::FORBIDDEN,
            Json(ApiError::new(
                format!("File is not writable: {requested}"),
                "NOT_WRITABLE",
            )),
        ),
        FilesError::Io(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(
                format!("Unexpected IO failure: {e}"),
                "INTERNAL_ERROR",
            )),
        ),
    }
}

fn snapshot_error_response(err: SnapshotError, requested: &str) -> (StatusCode, Json<ApiError>) {
    match err {
        SnapshotError::Files(e) => files_error_response(e, requested),
        SnapshotError::FileNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                format!("File not found: {requested}"),
                "NOT_FOUND",
            )),
        ),
        SnapshotError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                format!("Snapshot not found: {id}"),
                "SNAPSHOT_NOT_FOUND",
            )),
        ),
        SnapshotError::AllSlotsLocked => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "All snapshot slots are locked",
                "ALL_SLOTS_LOCKED",
            )),
        ),
        SnapshotError::StorageUnavailable(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(
                format!("Snapshot storage unavailable: {e}"),
                "STORAGE_UNAVAILABLE",
            )),
        ),
    }
}

// =============================================================================
// Health
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "healthy": true,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// =============================================================================
// File endpoints
// =============================================================================

#[derive(Debug, Deserialize)]
struct FileQuery {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    view: Option<bool>,
}

#[derive(Debug, Serialize)]
struct FileContentResponse {
    content: String,
    writable: bool,
    path: String,
}

async fn file_get(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let Some(path) = query.path else {
        return Err(ApiError::bad_request("Missing path"));
    };

    let resolved = state
        .files
        .resolver()
        .resolve(&path)
        .map_err(|e| files_error_response(e, &path))?;

    let content = state
        .files
        .read(&resolved, query.view.unwrap_or(false))
        .await
        .map_err(|e| files_error_response(e, &path))?;

    match content {
        FileContent::Text { content, writable } => Ok(Json(FileContentResponse {
            content,
            writable,
            path,
        })
        .into_response()),
        FileContent::Binary {
            bytes,
            mime,
            filename,
        } => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
            let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "'"));
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition)
                    .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
            );
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            Ok((headers, bytes).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
struct WriteFileRequest {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

async fn file_post(
    State(state): State<AppState>,
    Json(req): Json<WriteFileRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let Some(path) = req.path else {
        return Err(ApiError::bad_request("Missing path"));
    };
    let Some(content) = req.content else {
        return Err(ApiError::bad_request("Missing content"));
    };

    let resolved = state
        .files
        .resolver()
        .resolve(&path)
        .map_err(|e| files_error_response(e, &path))?;

    state
        .files
        .write(&resolved, &content)
        .await
        .map_err(|e| files_error_response(e, &path))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "File saved"
    })))
}

// =============================================================================
// Snapshot endpoints
// =============================================================================

#[derive(Debug, Deserialize)]
struct SnapshotsQuery {
    #[serde(rename = "filePath", default)]
    file_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct SnapshotListResponse {
    snapshots: Vec<Snapshot>,
}

async fn snapshots_list(
    State(state): State<AppState>,
    Query(query): Query<SnapshotsQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let Some(file_path) = query.file_path else {
        return Err(ApiError::bad_request("Missing filePath"));
    };

    let snapshots = state
        .snapshots
        .list(&file_path)
        .await
        .map_err(|e| snapshot_error_response(e, &file_path))?;

    Ok(Json(SnapshotListResponse { snapshots }))
}

#[derive(Debug, Deserialize)]
struct CreateSnapshotRequest {
    #[serde(rename = "filePath", default)]
    file_path: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Serialize)]
struct SlotsLockedResponse {
    error: String,
    code: String,
    snapshots: Vec<Snapshot>,
}

async fn snapshots_create(
    State(state): State<AppState>,
    Json(req): Json<CreateSnapshotRequest>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let Some(file_path) = req.file_path else {
        return Err(ApiError::bad_request("Missing filePath"));
    };
    let Some(content) = req.content else {
        return Err(ApiError::bad_request("Missing content"));
    };
    let language = req.language.unwrap_or_else(|| "plaintext".to_string());

    match state.snapshots.create(&file_path, &content, &language).await {
        Ok(snapshots) => Ok(Json(serde_json::json!({
            "success": true,
            "message": "Snapshot created",
            "snapshots": snapshots
        }))
        .into_response()),
        Err(SnapshotError::AllSlotsLocked) => {
            // Recoverable: hand back the untouched collection so the UI can
            // offer unlock/delete choices.
            let snapshots = state.snapshots.list(&file_path).await.unwrap_or_default();
            Ok((
                StatusCode::BAD_REQUEST,
                Json(SlotsLockedResponse {
                    error: "All snapshot slots are locked".to_string(),
                    code: "ALL_SLOTS_LOCKED".to_string(),
                    snapshots,
                }),
            )
                .into_response())
        }
        Err(e) => Err(snapshot_error_response(e, &file_path)),
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotRefRequest {
    #[serde(rename = "filePath", default)]
    file_path: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

async fn snapshots_toggle_lock(
    State(state): State<AppState>,
    Json(req): Json<SnapshotRefRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let Some(file_path) = req.file_path else {
        return Err(ApiError::bad_request("Missing filePath"));
    };
    let Some(id) = req.id else {
        return Err(ApiError::bad_request("Missing id"));
    };

    let snapshot = state
        .snapshots
        .toggle_lock(&file_path, &id)
        .await
        .map_err(|e| snapshot_error_response(e, &file_path))?;

    Ok(Json(snapshot))
}

async fn snapshots_delete(
    State(state): State<AppState>,
    Json(req): Json<SnapshotRefRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let Some(file_path) = req.file_path else {
        return Err(ApiError::bad_request("Missing filePath"));
    };
    let Some(id) = req.id else {
        return Err(ApiError::bad_request("Missing id"));
    };

    state
        .snapshots
        .delete(&file_path, &id)
        .await
        .map_err(|e| snapshot_error_response(e, &file_path))?;

    Ok(Json(serde_json::json!({ "success": true })))
}
