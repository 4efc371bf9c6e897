//! The durable sighting store — the append-only log of accepted vessel
//! position reports.
//!
//! Writes go through [`append_sighting`], which persists one [`Sighting`]
//! and is durable when it returns. Reads are the four query shapes the
//! HTTP API projects over the log:
//!
//! | Function | Shape |
//! |----------|-------|
//! | [`query_all`] | every sighting, newest first |
//! | [`query_latest_per_vessel`] | one row per vessel, its most recent sighting |
//! | [`query_history`] | one vessel's trail, oldest first |
//! | [`query_stats`] | totals plus the five most-sighted vessels |
//!
//! All functions take a plain `&rusqlite::Connection`; callers own
//! pooling and blocking-context concerns. Concurrent append and query is
//! safe under SQLite's WAL isolation — the store adds no locking of its
//! own.

mod error;
mod store;

pub use error::StoreError;
pub use store::{
    append_sighting, query_all, query_history, query_latest_per_vessel, query_stats,
    TrafficStats, VesselActivity,
};
