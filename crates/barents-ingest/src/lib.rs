//! The ingestion-persistence-fanout pipeline of the Barents vessel
//! tracker.
//!
//! This crate owns everything between the upstream AIS feed and the
//! queryable sighting log:
//!
//! - [`normalize`] turns a raw aisstream.io frame into a validated
//!   [`barents_types::VesselReport`] or rejects it.
//! - [`StreamConnector`] maintains the outbound WebSocket connection:
//!   connect, subscribe, consume, reconnect after a fixed 3-second delay,
//!   forever.
//! - [`FeedRegistry`] tracks connected live viewers and broadcasts each
//!   accepted sighting to all of them, best effort.
//! - [`IngestPipeline`] wires the three together and enforces the one
//!   ordering rule of the system: a sighting is durably appended before
//!   it is broadcast, and never broadcast if the append fails.
//!
//! The query endpoints in `barents-server` are plain projections over the
//! store; all concurrency, failure-recovery, and ordering concerns live
//! here.

mod connector;
mod feed;
mod normalize;
mod pipeline;

pub use connector::{
    AisTransport, FrameSource, StreamConnector, StreamTransport, SubscriptionRequest,
    TransportError, AISSTREAM_URL, RETRY_DELAY,
};
pub use feed::{FeedRegistry, SubscriberId};
pub use normalize::{normalize, Rejection, UNKNOWN_VESSEL_PLACEHOLDER};
pub use pipeline::IngestPipeline;
