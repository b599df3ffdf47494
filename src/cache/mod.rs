//! Cache Module
//!
//! Fixed-capacity in-memory LRU cache for order records, shared between the
//! request paths and the stream consumer.

mod engine;
mod lru;
mod stats;


// Re-export public types
pub use engine::OrderCache;
pub use stats::CacheStats;
