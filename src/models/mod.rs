//! Domain and API models for the order cache service
//!
//! Defines the order record, the stream event envelope, and the DTOs used
//! for serializing HTTP response bodies.

pub mod order;
pub mod responses;

// Re-export commonly used types
pub use order::{EventKind, Order, StreamEvent};
pub use responses::{ErrorResponse, HealthResponse, OrderResponse, StatsResponse};
