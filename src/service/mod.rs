//! Order Service Module
//!
//! Read-through orchestration between the cache engine and the store
//! gateway. This is the sole entry point the request layer uses.

use std::sync::Arc;

use tracing::debug;

use crate::cache::OrderCache;
use crate::error::{Result, ServiceError};
use crate::models::Order;
use crate::store::OrderStore;

// == Order Service ==
/// Satisfies order lookups: cache first, store on miss, populate on success.
pub struct OrderService {
    cache: Arc<OrderCache>,
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    /// Creates a service over a shared cache and store gateway.
    pub fn new(cache: Arc<OrderCache>, store: Arc<dyn OrderStore>) -> Self {
        Self { cache, store }
    }

    // == Get Order ==
    /// Looks up an order by identifier.
    ///
    /// The fast path is a cache hit and never touches the store. On a miss
    /// the store is consulted; a found order populates the cache before it
    /// is returned, while NotFound and transient store failures leave the
    /// cache untouched.
    ///
    /// Between the miss and the store read, the stream consumer may insert
    /// a fresher version for the same uid; the unconditional put below can
    /// then overwrite it with the staler store copy. That overwrite is an
    /// accepted trade-off of this read-through design.
    pub async fn get_order(&self, uid: &str) -> Result<Order> {
        if let Some(order) = self.cache.get(uid) {
            debug!(uid, version = order.version, "Cache hit");
            return Ok(order);
        }

        debug!(uid, "Cache miss, consulting store");
        match self.store.get(uid).await {
            Ok(order) => {
                self.cache.put(order.clone());
                Ok(order)
            }
            Err(err @ ServiceError::NotFound(_)) => Err(err),
            Err(ServiceError::Transient(msg)) => {
                Err(ServiceError::Transient(msg))
            }
            Err(other) => Err(ServiceError::Internal(other.to_string())),
        }
    }
}
