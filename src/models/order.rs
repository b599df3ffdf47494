//! Order Record and Stream Event Models
//!
//! The order payload is opaque to the caching layer: it is carried as raw
//! JSON and never interpreted. The version field is the only part of an
//! order the subsystem reasons about, to reject stale stream deliveries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Order ==
/// A single order record as served to clients and held in the cache.
///
/// Immutable once constructed; updates replace the record wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier
    pub uid: String,
    /// Business fields, opaque to the cache
    pub payload: Value,
    /// Monotonically increasing version used to detect stale events
    pub version: u64,
}

impl Order {
    /// Creates a new order record.
    pub fn new(uid: impl Into<String>, payload: Value, version: u64) -> Self {
        Self {
            uid: uid.into(),
            payload,
            version,
        }
    }
}

// == Event Kind ==
/// Kind of mutation a stream event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Insert if absent, else update
    Upsert,
    /// Remove the order; the store is authoritative for deletions
    Delete,
}

// == Stream Event ==
/// One update event delivered by the external stream.
///
/// Delivery is at-least-once: duplicates and reordering are expected, which
/// is why upsert application is conditional on the version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Identifier of the order the event concerns
    pub uid: String,
    /// Whether this is an upsert or a delete
    pub kind: EventKind,
    /// New business fields; ignored for deletes
    #[serde(default)]
    pub payload: Value,
    /// Version of the order after this event
    pub version: u64,
}

impl StreamEvent {
    /// Decodes an event from its JSON wire frame.
    pub fn decode(frame: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(frame)
    }

    /// Builds the order record an upsert event carries.
    pub fn into_order(self) -> Order {
        Order {
            uid: self.uid,
            payload: self.payload,
            version: self.version,
        }
    }
}
