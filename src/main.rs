//! Image Quiz Backend · real photo or AI-generated?
//!
//! - Axum HTTP API: start a session, answer image by image, get a score
//! - Balanced sampling of real vs synthetic images from ./images/<category>/
//! - Results appended to a CSV file or a remote spreadsheet bridge; leaderboard read back
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                   : u16 (default 3000)
//!   QUIZ_CONFIG_PATH       : path to TOML config (sampling sizes, truth mode, sink)
//!   IMAGES_DIR             : overrides `images_dir` from the config
//!   RESULTS_WEBHOOK_TOKEN  : bearer token for the remote sheet sink
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"

mod config;
mod domain;
mod error;
mod pool;
mod protocol;
mod routes;
mod sampler;
mod scoring;
mod session;
mod sink;
mod state;
mod telemetry;
mod truth;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::config::load_config_from_env;
use crate::routes::build_router;
use crate::sink::build_sink;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = load_config_from_env();
  let sink = build_sink(&config.sink)?;

  // Resolver + image pool scan; a misconfigured label set aborts startup.
  let state = Arc::new(AppState::new(config, sink)?);

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "imgquiz_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "imgquiz_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "imgquiz_backend", error = %e, "Failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}
