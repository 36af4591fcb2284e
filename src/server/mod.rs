//! HTTP chat server.
//!
//! Serves the chat page and a small JSON API. Turns stream back as
//! server-sent events; see [`events`].

pub mod error;
pub mod events;
pub mod handlers;

use crate::error::{CommandError, Result};
use crate::retrieval::Indexer;
use crate::session::{Orchestrator, SessionStore};
use actix_web::{App, HttpResponse, HttpServer, error::JsonPayloadError, web};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8501;

/// Default listen address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Largest accepted JSON body, sized for uploaded documents.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// How often idle sessions are swept while serving.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// State shared by all workers.
pub struct AppState {
    /// Runs conversation turns.
    pub orchestrator: Orchestrator,
    /// Live sessions.
    pub sessions: SessionStore,
    /// Document index.
    pub indexer: Arc<Indexer>,
    /// Chat model name, reported by `/health`.
    pub model: String,
}

/// Registers every route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .route("/sessions", web::post().to(handlers::create_session))
                .route("/sessions/{id}", web::get().to(handlers::get_session))
                .route("/sessions/{id}", web::delete().to(handlers::delete_session))
                .route(
                    "/sessions/{id}/messages",
                    web::post().to(handlers::post_message),
                )
                .route("/sessions/{id}/reset", web::post().to(handlers::reset_session))
                .route("/documents", web::get().to(handlers::list_documents))
                .route("/documents", web::post().to(handlers::upload_document))
                .route("/documents", web::delete().to(handlers::clear_documents))
                .route(
                    "/documents/{id}",
                    web::delete().to(handlers::delete_document),
                ),
        );
}

/// JSON extractor settings: larger bodies and `{ "error": ... }` rejections.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err: JsonPayloadError, _req| {
            let response = HttpResponse::BadRequest().json(json!({ "error": err.to_string() }));
            actix_web::error::InternalError::from_response(err, response).into()
        })
}

/// Serves until interrupted.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run(state: AppState, host: &str, port: u16) -> Result<()> {
    let state = web::Data::new(state);
    let server = HttpServer::new({
        let state = state.clone();
        move || {
            App::new()
                .app_data(state.clone())
                .app_data(json_config())
                .configure(configure_routes)
        }
    })
    .bind((host, port))
    .map_err(|e| CommandError::ExecutionFailed(format!("cannot bind {host}:{port}: {e}")))?;

    info!(%host, port, model = %state.model, "serving chat UI");
    let sweeper = tokio::spawn(sweep_idle_sessions(state.clone(), SWEEP_INTERVAL));
    let outcome = server.run().await;
    sweeper.abort();
    outcome?;
    info!("server stopped");
    Ok(())
}

/// Evicts idle sessions every `period` until aborted.
pub async fn sweep_idle_sessions(state: web::Data<AppState>, period: Duration) {
    let mut ticks = tokio::time::interval(period);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        let evicted = state.sessions.evict_idle();
        if evicted > 0 {
            debug!(evicted, live = state.sessions.len(), "swept idle sessions");
        }
    }
}
