//! Document upload, listing, status, and deletion

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::AppState;
use crate::types::{DeleteResponse, DocumentSummary, StatusResponse, UploadResponse};

/// POST /api/documents - multipart upload, indexing runs in the background
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("Invalid multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::UnsupportedType("upload has no filename".to_string()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::internal(format!("Failed to read upload: {}", e)))?;

        let response = state.accept_upload(filename, data.to_vec()).await?;
        return Ok((StatusCode::ACCEPTED, Json(response)));
    }

    Err(Error::internal("Multipart request had no 'file' field"))
}

/// GET /api/documents
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<DocumentSummary>> {
    let mut summaries: Vec<DocumentSummary> = state
        .documents
        .iter()
        .map(|entry| DocumentSummary::from(entry.value()))
        .collect();
    summaries.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    Json(summaries)
}

/// GET /api/documents/:id/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>> {
    if !state.documents.contains_key(&id) {
        return Err(Error::DocumentNotFound(id));
    }
    Ok(Json(StatusResponse::from_lookup(id, state.statuses.get(&id))))
}

/// DELETE /api/documents/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    let response = state.delete_document(id).await?;
    Ok(Json(response))
}
