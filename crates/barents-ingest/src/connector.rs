//! Upstream stream connector: owns the connection to the AIS feed.
//!
//! The connector is an explicit state machine with two states. From
//! *disconnected* it dials the transport and sends one subscription
//! control frame; once *connected* it forwards every inbound text frame
//! into a bounded channel consumed by the pipeline. Any transport error
//! or orderly close drops it back to *disconnected*, where it waits a
//! fixed [`RETRY_DELAY`] and tries again — unbounded retries, no circuit
//! breaker. Upstream outages are expected to be transient; viewers simply
//! see a silent gap until the stream resumes.
//!
//! The transport is a trait so tests can script connection failures and
//! canned frames without a network.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// The aisstream.io push endpoint.
pub const AISSTREAM_URL: &str = "wss://stream.aisstream.io/v0/stream";

/// Fixed wait between reconnect attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Errors reported by a [`StreamTransport`].
///
/// These never propagate past the connector; they only decide when to
/// drop back to the disconnected state.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying WebSocket failed to connect, read, or write.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The subscription control frame sent on every (re)connect.
///
/// Field names follow the aisstream.io wire format. The bounding box is
/// `[[south, west], [north, east]]` in decimal degrees.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    #[serde(rename = "APIKey")]
    pub api_key: String,
    #[serde(rename = "BoundingBoxes")]
    pub bounding_boxes: Vec<[[f64; 2]; 2]>,
}

impl SubscriptionRequest {
    /// Serializes the request to its wire form.
    pub fn control_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// An established upstream session yielding raw text frames.
pub trait FrameSource {
    /// Waits for the next text frame.
    ///
    /// `Ok(None)` means the remote closed the stream in an orderly way;
    /// both that and `Err` send the connector back to reconnecting.
    fn next_frame(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<String>, TransportError>> + Send;
}

/// Dials the upstream feed and performs the subscription handshake.
pub trait StreamTransport {
    /// The session type produced by a successful connect.
    type Source: FrameSource + Send;

    /// Connects and sends the subscription control frame.
    fn connect(
        &mut self,
        subscribe_frame: &str,
    ) -> impl std::future::Future<Output = Result<Self::Source, TransportError>> + Send;
}

/// The production transport: a TLS WebSocket via tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct AisTransport {
    url: String,
}

impl AisTransport {
    /// A transport dialing the given WebSocket URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for AisTransport {
    fn default() -> Self {
        Self::new(AISSTREAM_URL)
    }
}

impl StreamTransport for AisTransport {
    type Source = AisFrameSource;

    fn connect(
        &mut self,
        subscribe_frame: &str,
    ) -> impl std::future::Future<Output = Result<Self::Source, TransportError>> + Send {
        let url = self.url.clone();
        let subscribe = subscribe_frame.to_string();
        async move {
            let (mut ws, _response) = connect_async(&url).await?;
            ws.send(Message::Text(subscribe.into())).await?;
            Ok(AisFrameSource { ws })
        }
    }
}

/// A live aisstream.io session.
pub struct AisFrameSource {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FrameSource for AisFrameSource {
    fn next_frame(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<String>, TransportError>> + Send {
        async move {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                    // Control traffic; tungstenite answers pings itself.
                    Some(Ok(
                        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_),
                    )) => continue,
                    Some(Ok(Message::Close(_))) | None => return Ok(None),
                    Some(Err(e)) => return Err(TransportError::WebSocket(e)),
                }
            }
        }
    }
}

/// Maintains upstream connectivity and feeds raw frames to the pipeline.
///
/// `run` only returns when the downstream frame channel has been closed,
/// i.e. at process shutdown.
pub struct StreamConnector<T> {
    transport: T,
    subscribe_frame: String,
    retry_delay: Duration,
    frame_tx: mpsc::Sender<String>,
}

impl<T: StreamTransport> StreamConnector<T> {
    /// A connector that will send `subscribe_frame` after every connect
    /// and push received frames into `frame_tx`.
    pub fn new(transport: T, subscribe_frame: String, frame_tx: mpsc::Sender<String>) -> Self {
        Self {
            transport,
            subscribe_frame,
            retry_delay: RETRY_DELAY,
            frame_tx,
        }
    }

    /// Overrides the reconnect delay. Tests use this with paused time.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Drives the connect/consume/reconnect loop until shutdown.
    pub async fn run(mut self) {
        loop {
            match self.transport.connect(&self.subscribe_frame).await {
                Ok(mut source) => {
                    tracing::info!("connected to upstream AIS stream");
                    loop {
                        match source.next_frame().await {
                            Ok(Some(frame)) => {
                                if self.frame_tx.send(frame).await.is_err() {
                                    tracing::info!("frame channel closed, stopping connector");
                                    return;
                                }
                            }
                            Ok(None) => {
                                tracing::warn!("upstream closed the stream");
                                break;
                            }
                            Err(e) => {
                                tracing::warn!("upstream read failed: {}", e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("upstream connect failed: {}", e);
                }
            }

            if self.frame_tx.is_closed() {
                tracing::info!("frame channel closed, stopping connector");
                return;
            }

            tracing::debug!(delay_secs = self.retry_delay.as_secs(), "reconnecting after delay");
            sleep(self.retry_delay).await;
        }
    }
}
