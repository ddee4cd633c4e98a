//! Memodeck · Flashcard Study Backend
//!
//! - Axum HTTP + WebSocket API
//! - File-backed lesson storage + shared community pool
//! - Optional OpenAI integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   LESSONS_DIR       : lesson storage directory (default ./lessons)
//!   SNAPSHOT_PATH     : local snapshot file (default LESSONS_DIR/.snapshot.json)
//!   OPENAI_API_KEY    : enables OpenAI integration if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL : default "gpt-4o-mini"
//!   OPENAI_STRONG_MODEL : default "gpt-4o"
//!   AGENT_CONFIG_PATH : path to TOML config (prompts + optional seed decks)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod config;
mod domain;
mod error;
mod logic;
mod openai;
mod parser;
mod protocol;
mod quiz;
mod routes;
mod seeds;
mod state;
mod store;
mod sync;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (stores, synchronizer, quiz engine,
  // OpenAI client, prompts) and load what the stores already hold.
  let state = Arc::new(AppState::new());
  state.bootstrap().await;

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "memodeck_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
