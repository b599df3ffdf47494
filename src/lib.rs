//! Order Cache - an order lookup service
//!
//! Serves order records over HTTP from a bounded LRU cache kept warm by a
//! stream of update events, falling back to the persistent store on misses.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod stream;

pub use api::AppState;
pub use cache::OrderCache;
pub use config::Config;
pub use error::ServiceError;
pub use service::OrderService;
