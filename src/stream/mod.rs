//! Event Stream Module
//!
//! Seam between the cache-warming consumer and the external event broker.
//! Only the consumer's effect on the cache is in scope here; the broker's
//! wire protocol and connection management live behind the [`EventStream`]
//! trait, so a real broker client can slot in without touching the
//! consumer. The in-process [`ChannelStream`] is the transport the binary
//! and tests run against.

mod consumer;

pub use consumer::{spawn_consumer_task, RetryPolicy};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Result, ServiceError};
use crate::models::StreamEvent;

// == Event Stream Trait ==
/// Receive side of the order event stream.
///
/// Yields raw event frames in broker delivery order. Delivery is
/// at-least-once: duplicates and reordering across reconnects are expected
/// and handled by the consumer's version check.
#[async_trait]
pub trait EventStream: Send {
    /// Blocks until the next frame is available.
    ///
    /// # Errors
    /// [`ServiceError::Transient`](crate::error::ServiceError) on connection
    /// drop or broker unavailability; the consumer retries with backoff.
    async fn recv(&mut self) -> Result<Vec<u8>>;
}

// == Channel Stream ==
/// In-process event stream backed by a tokio channel.
pub struct ChannelStream {
    rx: mpsc::Receiver<Vec<u8>>,
}

/// Send side paired with a [`ChannelStream`].
#[derive(Clone)]
pub struct StreamPublisher {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelStream {
    /// Creates a connected publisher/stream pair.
    pub fn pair(buffer: usize) -> (StreamPublisher, ChannelStream) {
        let (tx, rx) = mpsc::channel(buffer);
        (StreamPublisher { tx }, ChannelStream { rx })
    }
}

impl StreamPublisher {
    /// Publishes an event, JSON-encoded as on the real wire.
    pub async fn publish(&self, event: &StreamEvent) -> Result<()> {
        let frame = serde_json::to_vec(event)
            .map_err(|e| ServiceError::Internal(format!("cannot encode event: {}", e)))?;
        self.publish_raw(frame).await
    }

    /// Publishes a raw frame, bypassing encoding. Useful for testing the
    /// consumer's handling of malformed payloads.
    pub async fn publish_raw(&self, frame: Vec<u8>) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| ServiceError::Transient("stream consumer gone".to_string()))
    }
}

#[async_trait]
impl EventStream for ChannelStream {
    async fn recv(&mut self) -> Result<Vec<u8>> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| ServiceError::Transient("stream disconnected".to_string()))
    }
}
