//! API Handlers
//!
//! HTTP request handlers for each order service endpoint. The handlers are
//! a thin shell: all lookup logic lives in the order service, all caching
//! in the cache engine.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::OrderCache;
use crate::error::Result;
use crate::models::{HealthResponse, OrderResponse, StatsResponse};
use crate::service::OrderService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lookup orchestration (cache-then-store)
    pub service: Arc<OrderService>,
    /// Shared cache, exposed here only for the stats endpoint
    pub cache: Arc<OrderCache>,
}

impl AppState {
    /// Creates a new AppState over the shared service and cache.
    pub fn new(service: Arc<OrderService>, cache: Arc<OrderCache>) -> Self {
        Self { service, cache }
    }
}

/// Handler for GET /order/:uid
///
/// Returns the order from cache or store, 404 when it exists in neither,
/// 503 when the store is momentarily unavailable.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<OrderResponse>> {
    let order = state.service.get_order(&uid).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();

    Json(StatsResponse::new(
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.total_entries,
    ))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Order;
    use crate::store::{MemoryStore, OrderStore};
    use serde_json::json;

    fn test_state() -> (AppState, Arc<MemoryStore>) {
        let cache = Arc::new(OrderCache::new(16).unwrap());
        let store = Arc::new(MemoryStore::new());
        let gateway: Arc<dyn OrderStore> = store.clone();
        let service = Arc::new(OrderService::new(Arc::clone(&cache), gateway));
        (AppState::new(service, cache), store)
    }

    #[tokio::test]
    async fn test_get_order_handler_found() {
        let (state, store) = test_state();
        store.upsert(Order::new("o1", json!({"total": 5}), 1));

        let result = get_order_handler(State(state), Path("o1".to_string())).await;
        let response = result.unwrap();
        assert_eq!(response.uid, "o1");
        assert_eq!(response.version, 1);
    }

    #[tokio::test]
    async fn test_get_order_handler_missing() {
        let (state, _store) = test_state();

        let result = get_order_handler(State(state), Path("ghost".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_handler_counts_lookups() {
        let (state, store) = test_state();
        store.upsert(Order::new("o1", json!({}), 1));

        // Miss + populate, then hit
        get_order_handler(State(state.clone()), Path("o1".to_string()))
            .await
            .unwrap();
        get_order_handler(State(state.clone()), Path("o1".to_string()))
            .await
            .unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 1);
        assert_eq!(response.misses, 1);
        assert_eq!(response.total_entries, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
