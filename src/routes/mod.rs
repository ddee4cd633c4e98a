//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/generate", post(http::http_generate))
        .route(
            "/api/v1/lessons",
            get(http::http_list_lessons).post(http::http_save_lesson),
        )
        .route("/api/v1/lessons/suggest-name", post(http::http_suggest_name))
        .route("/api/v1/lessons/load", post(http::http_load_lesson))
        .route("/api/v1/lessons/:lesson_id", delete(http::http_delete_lesson))
        .route("/api/v1/community/lessons", get(http::http_list_community))
        .route("/api/v1/community/share", post(http::http_share_lesson))
        .route("/api/v1/community/unshare", post(http::http_unshare_lesson))
        .route("/api/v1/community/copy", post(http::http_copy_lesson))
        .route("/api/v1/quiz", get(http::http_quiz_state))
        .route("/api/v1/quiz/start", post(http::http_quiz_start))
        .route("/api/v1/quiz/answer", post(http::http_quiz_answer))
        .route("/api/v1/quiz/next", post(http::http_quiz_next))
        .route("/api/v1/quiz/restart", post(http::http_quiz_restart))
        .route("/api/v1/quiz/exit", post(http::http_quiz_exit))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
