//! Store Gateway Module
//!
//! Contract with the persistent order store, plus the in-memory
//! implementation the binary runs against. The store's internal schema and
//! query engine are deliberately opaque: the rest of the system only ever
//! sees an async lookup that either yields an order, reports it missing, or
//! fails transiently.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Order;

// == Order Store Trait ==
/// Opaque lookup of an order by identifier against durable storage.
///
/// Implementations must be safe for concurrent calls from multiple lookup
/// paths, and must surface their own timeouts as
/// [`ServiceError::Transient`](crate::error::ServiceError) rather
/// than blocking indefinitely.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetches the order for `uid`.
    ///
    /// # Errors
    /// - [`ServiceError::NotFound`](crate::error::ServiceError) when the
    ///   identifier does not exist in the store
    /// - [`ServiceError::Transient`](crate::error::ServiceError) on
    ///   timeout or momentary unavailability
    async fn get(&self, uid: &str) -> Result<Order>;
}
