//! Router assembly: catalog/progress API, the play socket, the SPA bundle,
//! CORS and HTTP tracing.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Read-only JSON views, mounted under `/api/v1`.
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(http::http_health))
        .route("/scenarios", get(http::http_list_scenarios))
        .route("/scenarios/:id", get(http::http_get_scenario))
        .route("/commands", get(http::http_list_commands))
        .route("/progress", get(http::http_get_progress))
}

/// Frontend bundle directory: STATIC_DIR, else `./static`.
fn static_dir() -> PathBuf {
    std::env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./static"))
}

/// - `/ws`: one play session per socket
/// - `/api/v1/...`: catalog listings and player progress
/// - anything else: the SPA, falling back to its index.html
pub fn build_router(state: Arc<AppState>) -> Router {
    let dir = static_dir();
    info!(target: "opsdrill", dir = %dir.display(), "Serving static frontend");
    let spa = ServeDir::new(&dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(dir.join("index.html")));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(spa)
}
