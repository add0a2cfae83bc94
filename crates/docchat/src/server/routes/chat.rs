//! Chat and session routes

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
    Json,
};
use bytes::Bytes;
use futures_util::StreamExt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::AppState;
use crate::types::{ChatRequest, SessionResponse, SessionSummary};

/// POST /api/chat - streams the answer as plain text.
///
/// The session id travels in the `x-session-id` response header so a client
/// starting a new conversation can pick it up before reading the stream.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response> {
    let (session_id, stream) = state.engine.chat_turn(request).await?;

    let body = Body::from_stream(stream.map(|fragment| Ok::<_, Infallible>(Bytes::from(fragment))));

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header("x-session-id", session_id.to_string())
        .body(body)
        .map_err(|e| Error::internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// GET /api/sessions
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SessionSummary>>> {
    let sessions = state.sessions.list_all().await?;
    Ok(Json(sessions.iter().map(SessionSummary::from).collect()))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let session = state
        .sessions
        .load(&id)
        .await?
        .ok_or(Error::SessionNotFound(id))?;
    Ok(Json(SessionResponse::from(session)))
}
