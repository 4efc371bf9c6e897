//! The ingestion pipeline: the one long-lived task that turns raw frames
//! into durable, broadcast sightings.
//!
//! Ordering is the whole point of this module: a sighting is appended to
//! the store *before* it is broadcast, and a failed append suppresses the
//! broadcast entirely. A viewer therefore never sees a sighting that is
//! not already retrievable from the historical queries.

use chrono::{SecondsFormat, Utc};
use tokio::sync::mpsc;

use barents_db::DbPool;
use barents_store::append_sighting;
use barents_types::{Sighting, VesselReport};

use crate::feed::FeedRegistry;
use crate::normalize::normalize;

/// Consumes raw frames, filters them, persists accepted sightings, and
/// fans them out to live viewers.
pub struct IngestPipeline {
    pool: DbPool,
    feed: FeedRegistry,
    frame_rx: mpsc::Receiver<String>,
}

impl IngestPipeline {
    /// A pipeline reading raw frames from `frame_rx`, writing through
    /// `pool`, and broadcasting via `feed`.
    pub fn new(pool: DbPool, feed: FeedRegistry, frame_rx: mpsc::Receiver<String>) -> Self {
        Self {
            pool,
            feed,
            frame_rx,
        }
    }

    /// Runs until the frame channel closes (process shutdown).
    ///
    /// Rejected frames are dropped silently — filtering is expected and
    /// frequent, not exceptional. Store write failures are logged with
    /// enough context for manual replay and the pipeline moves on; one
    /// bad write never halts ingestion of subsequent frames.
    pub async fn run(mut self) {
        let mut accepted: u64 = 0;
        let mut rejected: u64 = 0;

        while let Some(raw) = self.frame_rx.recv().await {
            match normalize(&raw) {
                Ok(report) => {
                    accepted += 1;
                    self.accept(report).await;
                }
                Err(reason) => {
                    rejected += 1;
                    tracing::trace!(%reason, "dropped raw frame");
                }
            }
        }

        tracing::info!(accepted, rejected, "frame channel closed, ingestion pipeline stopping");
    }

    /// Stamps, persists, and (on durable success) broadcasts one report.
    async fn accept(&self, report: VesselReport) {
        let seen_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let sighting = Sighting::from_report(report, seen_at);

        let pool = self.pool.clone();
        let to_store = sighting.clone();
        let result = tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| e.to_string())?;
            append_sighting(&conn, &to_store).map_err(|e| e.to_string())
        })
        .await;

        match result {
            Ok(Ok(_row_id)) => match serde_json::to_string(&sighting) {
                Ok(json) => self.feed.broadcast(&json).await,
                Err(e) => {
                    tracing::error!(
                        vessel = %sighting.name,
                        "failed to serialize sighting for broadcast: {}",
                        e
                    );
                }
            },
            Ok(Err(e)) => {
                // Not broadcast: viewers must never see a sighting that a
                // refresh could not retrieve. Name and timestamp identify
                // the lost report for manual replay from upstream.
                tracing::warn!(
                    vessel = %sighting.name,
                    seen_at = %sighting.seen_at,
                    "sighting append failed, broadcast suppressed: {}",
                    e
                );
            }
            Err(e) => {
                tracing::error!(
                    vessel = %sighting.name,
                    "append task join error: {}",
                    e
                );
            }
        }
    }
}
