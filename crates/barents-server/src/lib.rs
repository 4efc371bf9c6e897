//! Barents server library logic.
//!
//! The HTTP surface is read-only: viewers query the sighting log and
//! subscribe to the live feed, while writes arrive exclusively through
//! the upstream AIS ingestion pipeline.

pub mod api_ships;
pub mod api_ws;
pub mod config;

use axum::{routing::get, Extension, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use barents_db::DbPool;
use barents_ingest::FeedRegistry;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Live viewer registry, shared with the ingestion pipeline.
    pub feed: FeedRegistry,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/ships", get(api_ships::get_ships_handler))
        .route("/api/ships/latest", get(api_ships::get_latest_handler))
        .route("/api/ships/{name}/trail", get(api_ships::get_trail_handler))
        .route("/api/stats", get(api_ships::get_stats_handler))
        // The map UI fetches the unprefixed paths.
        .route("/ships", get(api_ships::get_ships_handler))
        .route("/ships/latest", get(api_ships::get_latest_handler))
        .route("/ships/{name}/trail", get(api_ships::get_trail_handler))
        .route("/stats", get(api_ships::get_stats_handler))
        .route("/ws", get(api_ws::ws_handler));

    // Serve the map UI if the directory exists.
    // Configured via BARENTS_STATIC_DIR env var; defaults to "static".
    let static_dir = std::env::var("BARENTS_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
    let router = if std::path::Path::new(&static_dir).join("index.html").exists() {
        tracing::info!(path = %static_dir, "serving static UI files");
        let index = format!("{}/index.html", static_dir);
        router.fallback_service(ServeDir::new(&static_dir).fallback(ServeFile::new(index)))
    } else {
        tracing::info!(path = %static_dir, "static directory not found, skipping UI serving");
        router
    };

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
