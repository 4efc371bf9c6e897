//! Historical query API handlers.
//!
//! Provides:
//! - `GET /api/ships` — every recorded sighting, newest first
//! - `GET /api/ships/latest` — the most recent sighting per vessel
//! - `GET /api/ships/{name}/trail` — one vessel's track, oldest first
//! - `GET /api/stats` — aggregate traffic statistics

use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use barents_store::{query_all, query_history, query_latest_per_vessel, query_stats, TrafficStats};
use barents_types::Sighting;
use rusqlite::Connection;
use std::sync::Arc;

/// Runs a read query against a pooled connection on the blocking pool,
/// mapping every failure to a 500 with a JSON error body. All four query
/// endpoints share this shape.
async fn run_query<T, F>(state: Arc<AppState>, query: F) -> Result<Json<T>, Response>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, barents_store::StoreError> + Send + 'static,
{
    let pool = state.pool.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| e.to_string())?;
        query(&conn).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("task join error: {}", e) })),
        )
            .into_response()
    })?
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e })),
        )
            .into_response()
    })?;

    Ok(Json(rows))
}

/// Handler for `GET /api/ships`.
///
/// Returns the full sighting log, newest first.
pub async fn get_ships_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Sighting>>, Response> {
    run_query(state, |conn| query_all(conn)).await
}

/// Handler for `GET /api/ships/latest`.
///
/// Returns the most recent sighting for each vessel, suitable for
/// painting current positions on the map.
pub async fn get_latest_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Sighting>>, Response> {
    run_query(state, |conn| query_latest_per_vessel(conn)).await
}

/// Handler for `GET /api/ships/{name}/trail`.
///
/// Returns every sighting of the named vessel in chronological order.
/// An unknown name yields an empty trail, not a 404: absence of
/// sightings is a valid answer.
pub async fn get_trail_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Sighting>>, Response> {
    run_query(state, move |conn| query_history(conn, &name)).await
}

/// Handler for `GET /api/stats`.
pub async fn get_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<TrafficStats>, Response> {
    run_query(state, |conn| query_stats(conn)).await
}
