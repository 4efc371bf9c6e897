//! Barents server binary — live AIS vessel tracking for the Barents Sea.
//!
//! Starts the upstream WebSocket connector and ingestion pipeline, then
//! an axum HTTP server with structured logging, database initialization,
//! and graceful shutdown on SIGTERM/SIGINT.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use barents_ingest::{
    AisTransport, FeedRegistry, IngestPipeline, StreamConnector, SubscriptionRequest,
};
use barents_server::config;
use barents_server::{app, AppState};

/// Buffer between the upstream connector and the ingestion pipeline.
/// Sized for bursts; at Barents Sea traffic levels it never fills.
const FRAME_BUFFER: usize = 1024;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("BARENTS_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // The upstream feed is useless without a credential, so fail now
    // rather than loop on rejected subscriptions.
    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Initialize database
    let pool = barents_db::create_pool(
        &config.database.path,
        barents_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool — check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied = barents_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    // Start ingestion: upstream connector feeding the pipeline.
    let feed = FeedRegistry::new();
    let (frame_tx, frame_rx) = mpsc::channel(FRAME_BUFFER);

    let subscription = SubscriptionRequest {
        api_key,
        bounding_boxes: vec![config.upstream.bounding_box],
    };
    let subscribe_frame = subscription
        .control_frame()
        .expect("subscription request serialization cannot fail");
    let connector = StreamConnector::new(
        AisTransport::new(&config.upstream.url),
        subscribe_frame,
        frame_tx,
    );
    let pipeline = IngestPipeline::new(pool.clone(), feed.clone(), frame_rx);

    tracing::info!(
        url = %config.upstream.url,
        bounding_box = ?config.upstream.bounding_box,
        "starting upstream AIS ingestion"
    );
    let connector_handle = tokio::spawn(connector.run());
    let pipeline_handle = tokio::spawn(pipeline.run());

    // Build application
    let app = app(AppState { pool, feed });
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting barents server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    connector_handle.abort();
    pipeline_handle.abort();

    tracing::info!("barents server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}
