//! Selected-file API handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use transmute_core::{EngineError, FileSummary};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub target: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertRequest {
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub detected: Option<String>,
    pub file: FileSummary,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/files
///
/// Adds the multipart `file` field to the session, then loads the engine if
/// needed and probes the file. A failed engine load still keeps the file.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileSummary>), ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let (name, data) = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let record = state.files().add(&name, data).await?;
    let mut file = record.lock().await;
    info!(file = %file.name(), bytes = file.size_bytes(), "File selected");

    match state.session().initialize().await {
        Ok(()) => {
            state.sniffer().detect(&mut file).await?;
        }
        Err(e) => warn!(file = %file.name(), "Engine unavailable, detection skipped: {}", e),
    }

    Ok((StatusCode::CREATED, Json(file.summary())))
}

/// GET /api/v1/files
pub async fn list_files(State(state): State<Arc<AppState>>) -> Json<FileListResponse> {
    let files = state.files().summaries().await;
    let count = files.len();
    Json(FileListResponse { files, count })
}

/// GET /api/v1/files/{name}
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<FileSummary>, ApiError> {
    let record = state.files().get(&name).await?;
    let file = record.lock().await;
    Ok(Json(file.summary()))
}

/// DELETE /api/v1/files/{name}
///
/// Drops the file from the session and from the engine's virtual filesystem.
pub async fn remove_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.files().remove(&name).await?;

    if state.session().is_ready().await {
        match state.session().remove_virtual_file(&name).await {
            Ok(()) | Err(EngineError::FileNotFound { .. }) | Err(EngineError::NotReady) => {}
            Err(e) => warn!(file = %name, "Failed to remove virtual file: {}", e),
        }
    }

    info!(file = %name, "File removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/files/{name}/detect
pub async fn detect_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<DetectResponse>, ApiError> {
    let record = state.files().get(&name).await?;
    let mut file = record.lock().await;

    let detected = state.sniffer().detect(&mut file).await?;
    Ok(Json(DetectResponse {
        detected,
        file: file.summary(),
    }))
}

/// PUT /api/v1/files/{name}/target
pub async fn set_target(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<TargetRequest>,
) -> Result<Json<FileSummary>, ApiError> {
    let record = state.files().get(&name).await?;
    let mut file = record.lock().await;

    file.select_target(&body.target)?;
    debug!(file = %file.name(), target = %body.target, "Target selected");
    Ok(Json(file.summary()))
}

/// POST /api/v1/files/{name}/convert
///
/// Accepts an optional `{"target": ...}` body that is applied first.
pub async fn convert_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<FileSummary>, ApiError> {
    let request: ConvertRequest = if body.is_empty() {
        ConvertRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?
    };

    let record = state.files().get(&name).await?;
    let mut file = record.lock().await;

    if let Some(target) = &request.target {
        file.select_target(target)?;
    }

    if !state.orchestrator().convert(&mut file).await? {
        return Err(ApiError::not_ready());
    }
    Ok(Json(file.summary()))
}

/// GET /api/v1/files/{name}/download
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.files().get(&name).await?;
    let handle = {
        let file = record.lock().await;
        state.exporter().prepare_download(&file)?
    };

    let disposition = handle.content_disposition();
    let (_, content_type, bytes) = handle.into_parts();

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
