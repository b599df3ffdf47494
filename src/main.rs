//! Order Cache - an order lookup service
//!
//! Serves order records over HTTP from a bounded LRU cache kept warm by a
//! stream of update events, falling back to the persistent store on misses.

mod api;
mod cache;
mod config;
mod error;
mod models;
mod service;
mod store;
mod stream;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use cache::OrderCache;
use config::Config;
use service::OrderService;
use store::{MemoryStore, OrderStore};
use stream::{spawn_consumer_task, ChannelStream, RetryPolicy};

/// Main entry point for the order cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables (invalid values fatal)
/// 3. Create the order store and the LRU cache
/// 4. Start the background stream consumer task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM, signalling the consumer
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Order Cache Service");

    // Load configuration; invalid values are fatal here and nowhere else
    let config = Config::from_env().context("loading configuration")?;
    info!(
        "Configuration loaded: cache_capacity={}, port={}, brokers={}, topic={}, group={}",
        config.cache_capacity,
        config.server_port,
        config.stream_brokers,
        config.stream_topic,
        config.stream_group
    );

    // Persistent store and shared cache
    let store = Arc::new(
        MemoryStore::from_seed_file(&config.store_path).context("loading order store")?,
    );
    let cache = Arc::new(OrderCache::new(config.cache_capacity).context("creating cache")?);
    info!("Cache initialized");

    // Stream consumer with its shutdown signal. The channel transport
    // stands in for the broker client; external producers publish through
    // the publisher handle, which must outlive the consumer.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (_publisher, events) = ChannelStream::pair(1024);
    let consumer_handle = spawn_consumer_task(
        Arc::clone(&cache),
        events,
        RetryPolicy::default(),
        shutdown_rx,
    );
    info!("Stream consumer started");

    // Request layer
    let gateway: Arc<dyn OrderStore> = store;
    let service = Arc::new(OrderService::new(Arc::clone(&cache), gateway));
    let app = create_router(AppState::new(service, cache));

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    // Tell the consumer to stop and wait for it to drain
    let _ = shutdown_tx.send(true);
    consumer_handle.await.context("joining consumer task")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
