//! API route handlers

pub mod chat;
pub mod documents;

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::server::AppState;

/// All routes under `/api`
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/documents", post(documents::upload).get(documents::list))
        .route("/documents/:id", axum::routing::delete(documents::delete))
        .route("/documents/:id/status", get(documents::status))
        .route("/chat", post(chat::chat))
        .route("/sessions", get(chat::list_sessions))
        .route("/sessions/:id", get(chat::get_session))
        .route("/info", get(info))
}

/// Service metadata and the active storage backend
async fn info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "session_backend": state.sessions.backend_name(),
        "durable": state.durable,
        "embedding_model": state.config.embeddings.model,
        "generation_model": state.config.llm.model,
    }))
}
