//! In-Memory Order Store
//!
//! Stand-in for the durable store behind the gateway contract, seeded from
//! a JSON file at startup. Lookups clone the stored record, matching the
//! snapshot-copy semantics the cache assumes.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::{Result, ServiceError};
use crate::models::Order;
use crate::store::OrderStore;

// == Memory Store ==
/// Concurrent in-memory order store.
pub struct MemoryStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Loads a store from a JSON file containing an array of orders.
    ///
    /// A missing seed file yields an empty store; an unreadable or
    /// unparsable one is a startup error.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Seed file not found, starting with empty store");
            return Ok(Self::new());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("cannot read seed file: {}", e)))?;
        let seeded: Vec<Order> = serde_json::from_str(&raw)
            .map_err(|e| ServiceError::Config(format!("invalid seed file: {}", e)))?;

        info!(path = %path.display(), orders = seeded.len(), "Order store seeded");

        let orders = seeded
            .into_iter()
            .map(|order| (order.uid.clone(), order))
            .collect();
        Ok(Self {
            orders: RwLock::new(orders),
        })
    }

    /// Inserts or replaces an order. Used by seeding and tests.
    pub fn upsert(&self, order: Order) {
        self.orders.write().insert(order.uid.clone(), order);
    }

    /// Removes an order. Used by tests simulating deletions.
    pub fn remove(&self, uid: &str) {
        self.orders.write().remove(uid);
    }

    /// Number of orders the store holds.
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn get(&self, uid: &str) -> Result<Order> {
        self.orders
            .read()
            .get(uid)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(uid.to_string()))
    }
}
