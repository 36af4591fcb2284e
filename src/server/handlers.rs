//! Route handlers.

use crate::error::Result;
use crate::retrieval::UPLOAD_SOURCE;
use crate::server::AppState;
use crate::server::events::{EVENT_STREAM, encode};
use actix_web::http::header;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use tracing::info;

/// Single-page chat UI.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Body of `POST /api/sessions/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// The user's message.
    pub message: String,
}

/// Body of `POST /api/documents`.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Document name; must end in `.txt` or `.md`.
    pub name: String,
    /// Document text.
    pub content: String,
}

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// `GET /health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "model": state.model,
        "sessions": state.sessions.len(),
        "snippets": state.indexer.index().len(),
    }))
}

/// `POST /api/sessions`
pub async fn create_session(state: web::Data<AppState>) -> HttpResponse {
    let session = state.sessions.create();
    HttpResponse::Created().json(json!({ "id": session.id() }))
}

/// `GET /api/sessions/{id}`
pub async fn get_session(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let session = state.sessions.get(&id)?;
    Ok(HttpResponse::Ok().json(session.snapshot()))
}

/// `POST /api/sessions/{id}/messages`
///
/// Streams the turn as server-sent events. Closing the connection cancels
/// the turn.
pub async fn post_message(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<MessageRequest>,
) -> Result<HttpResponse> {
    let session = state.sessions.get(&id)?;
    let events = state.orchestrator.start_turn(&session, &body.message)?;

    Ok(HttpResponse::Ok()
        .content_type(EVENT_STREAM)
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events.map(|event| Ok::<_, Infallible>(encode(&event)))))
}

/// `POST /api/sessions/{id}/reset`
pub async fn reset_session(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let session = state.sessions.get(&id)?;
    session.reset();
    Ok(HttpResponse::Ok().json(session.snapshot()))
}

/// `DELETE /api/sessions/{id}`
pub async fn delete_session(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    state.sessions.remove(&id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/documents`
pub async fn list_documents(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.indexer.list()?))
}

/// `POST /api/documents`
pub async fn upload_document(
    state: web::Data<AppState>,
    body: web::Json<UploadRequest>,
) -> Result<HttpResponse> {
    let document = state
        .indexer
        .index_text(body.name.trim(), UPLOAD_SOURCE, &body.content)
        .await?;
    info!(name = %document.name, "document uploaded");
    Ok(HttpResponse::Created().json(document))
}

/// `DELETE /api/documents/{id}`; accepts an ID or a name.
pub async fn delete_document(
    state: web::Data<AppState>,
    identifier: web::Path<String>,
) -> Result<HttpResponse> {
    let document = state.indexer.remove(&identifier)?;
    Ok(HttpResponse::Ok().json(document))
}

/// `DELETE /api/documents`
pub async fn clear_documents(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.indexer.reset()?;
    Ok(HttpResponse::NoContent().finish())
}
