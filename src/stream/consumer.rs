//! Stream Consumer Task
//!
//! Long-lived background task that pulls order events from the stream and
//! applies them to the cache: version-checked upserts, unconditional
//! deletes. A malformed frame is logged and skipped; a transient receive
//! failure is retried with exponential backoff for as long as the process
//! lives. The task watches a shutdown signal at every await point and exits
//! promptly once shutdown is requested, including mid-backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::OrderCache;
use crate::models::{EventKind, StreamEvent};
use crate::stream::EventStream;

// == Retry Policy ==
/// Backoff parameters for transient stream failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Upper bound the delay grows toward
    pub max_delay_ms: u64,
    /// Growth factor applied after each failed attempt
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

/// Exponential backoff state, reset after every successful receive.
struct Backoff {
    policy: RetryPolicy,
    current_ms: u64,
}

impl Backoff {
    fn new(policy: RetryPolicy) -> Self {
        let current_ms = policy.initial_delay_ms;
        Self { policy, current_ms }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_millis(self.current_ms);
        let grown = (self.current_ms as f64 * self.policy.multiplier) as u64;
        self.current_ms = grown.min(self.policy.max_delay_ms);
        delay
    }

    fn reset(&mut self) {
        self.current_ms = self.policy.initial_delay_ms;
    }
}

// == Consumer Task ==
/// Spawns the stream consumer loop.
///
/// Runs until the shutdown signal flips (or its sender drops). The loop
/// itself never terminates the process: per-event failures are isolated so
/// one bad frame cannot stop consumption of the frames behind it.
///
/// # Arguments
/// * `cache` - shared cache the events are applied to
/// * `stream` - receive side of the order event stream
/// * `policy` - backoff parameters for transient receive failures
/// * `shutdown` - watch channel flipped to `true` on shutdown
pub fn spawn_consumer_task<S>(
    cache: Arc<OrderCache>,
    mut stream: S,
    policy: RetryPolicy,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: EventStream + 'static,
{
    tokio::spawn(async move {
        info!("Starting stream consumer");
        let mut backoff = Backoff::new(policy);

        loop {
            let received = tokio::select! {
                _ = shutdown.changed() => break,
                received = stream.recv() => received,
            };

            match received {
                Ok(frame) => {
                    backoff.reset();
                    match StreamEvent::decode(&frame) {
                        Ok(event) => apply_event(&cache, event),
                        Err(e) => {
                            warn!(error = %e, "Skipping malformed event");
                        }
                    }
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Stream receive failed, retrying after backoff"
                    );
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!("Stream consumer stopped");
    })
}

/// Applies one decoded event to the cache.
fn apply_event(cache: &OrderCache, event: StreamEvent) {
    match event.kind {
        EventKind::Upsert => {
            let uid = event.uid.clone();
            let version = event.version;
            if cache.put_if_newer(event.into_order()) {
                debug!(uid = %uid, version, "Applied upsert");
            } else {
                debug!(uid = %uid, version, "Rejected stale upsert");
            }
        }
        // A delete always wins regardless of version; the store is
        // authoritative for deletions.
        EventKind::Delete => {
            cache.invalidate(&event.uid);
            debug!(uid = %event.uid, version = event.version, "Applied delete");
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Instant;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::{Result, ServiceError};
    use crate::stream::ChannelStream;

    fn upsert(uid: &str, version: u64) -> StreamEvent {
        StreamEvent {
            uid: uid.to_string(),
            kind: EventKind::Upsert,
            payload: json!({ "uid": uid }),
            version,
        }
    }

    fn delete(uid: &str, version: u64) -> StreamEvent {
        StreamEvent {
            uid: uid.to_string(),
            kind: EventKind::Delete,
            payload: json!(null),
            version,
        }
    }

    fn encode(event: &StreamEvent) -> Vec<u8> {
        serde_json::to_vec(event).unwrap()
    }

    /// Stream double yielding a scripted sequence, then pending forever.
    struct ScriptedStream {
        frames: VecDeque<Result<Vec<u8>>>,
    }

    impl ScriptedStream {
        fn new(frames: Vec<Result<Vec<u8>>>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    #[async_trait]
    impl EventStream for ScriptedStream {
        async fn recv(&mut self) -> Result<Vec<u8>> {
            match self.frames.pop_front() {
                Some(frame) => frame,
                None => std::future::pending().await,
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_delay_ms: 5,
            max_delay_ms: 50,
            multiplier: 2.0,
        }
    }

    /// Polls `cond` until it holds or two seconds pass.
    async fn wait_for(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_upsert_applied_to_cache() {
        let cache = Arc::new(OrderCache::new(8).unwrap());
        let (_tx, shutdown) = watch::channel(false);
        let stream = ScriptedStream::new(vec![Ok(encode(&upsert("o1", 3)))]);

        let _handle = spawn_consumer_task(Arc::clone(&cache), stream, fast_policy(), shutdown);

        wait_for(|| cache.get("o1").is_some()).await;
        assert_eq!(cache.get("o1").unwrap().version, 3);
    }

    #[tokio::test]
    async fn test_stale_upsert_rejected() {
        let cache = Arc::new(OrderCache::new(8).unwrap());
        let (_tx, shutdown) = watch::channel(false);
        let stream = ScriptedStream::new(vec![
            Ok(encode(&upsert("o1", 5))),
            Ok(encode(&upsert("o1", 3))),
            Ok(encode(&upsert("marker", 1))),
        ]);

        let _handle = spawn_consumer_task(Arc::clone(&cache), stream, fast_policy(), shutdown);

        // The marker arriving proves the stale event was already processed
        wait_for(|| cache.get("marker").is_some()).await;
        assert_eq!(cache.get("o1").unwrap().version, 5);
    }

    #[tokio::test]
    async fn test_delete_wins_regardless_of_version() {
        let cache = Arc::new(OrderCache::new(8).unwrap());
        cache.put(crate::models::Order::new("o1", json!({}), 10));

        let (_tx, shutdown) = watch::channel(false);
        // Delete carries an older version and must still apply
        let stream = ScriptedStream::new(vec![Ok(encode(&delete("o1", 2)))]);

        let _handle = spawn_consumer_task(Arc::clone(&cache), stream, fast_policy(), shutdown);

        wait_for(|| cache.get("o1").is_none()).await;
    }

    #[tokio::test]
    async fn test_malformed_event_skipped() {
        let cache = Arc::new(OrderCache::new(8).unwrap());
        let (_tx, shutdown) = watch::channel(false);
        let stream = ScriptedStream::new(vec![
            Ok(b"{ definitely not an event".to_vec()),
            Ok(encode(&upsert("o1", 1))),
        ]);

        let _handle = spawn_consumer_task(Arc::clone(&cache), stream, fast_policy(), shutdown);

        // Consumption continues past the bad frame
        wait_for(|| cache.get("o1").is_some()).await;
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let cache = Arc::new(OrderCache::new(8).unwrap());
        let (_tx, shutdown) = watch::channel(false);
        let stream = ScriptedStream::new(vec![
            Err(ServiceError::Transient("broker down".to_string())),
            Err(ServiceError::Transient("still down".to_string())),
            Ok(encode(&upsert("o1", 1))),
        ]);

        let _handle = spawn_consumer_task(Arc::clone(&cache), stream, fast_policy(), shutdown);

        wait_for(|| cache.get("o1").is_some()).await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_consumer() {
        let cache = Arc::new(OrderCache::new(8).unwrap());
        let (tx, shutdown) = watch::channel(false);
        // Idle stream: consumer sits in recv until told to stop
        let stream = ScriptedStream::new(vec![]);

        let handle = spawn_consumer_task(Arc::clone(&cache), stream, fast_policy(), shutdown);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("consumer did not stop after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_backoff() {
        let cache = Arc::new(OrderCache::new(8).unwrap());
        let (tx, shutdown) = watch::channel(false);
        // Endless failures with a long delay; shutdown must not wait it out
        let slow = RetryPolicy {
            initial_delay_ms: 60_000,
            max_delay_ms: 60_000,
            multiplier: 1.0,
        };
        let stream = ScriptedStream::new(vec![Err(ServiceError::Transient(
            "broker down".to_string(),
        ))]);

        let handle = spawn_consumer_task(Arc::clone(&cache), stream, slow, shutdown);

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("consumer did not stop during backoff")
            .unwrap();
    }

    #[tokio::test]
    async fn test_channel_stream_end_to_end() {
        let cache = Arc::new(OrderCache::new(8).unwrap());
        let (tx, shutdown) = watch::channel(false);
        let (publisher, stream) = ChannelStream::pair(16);

        let handle = spawn_consumer_task(Arc::clone(&cache), stream, fast_policy(), shutdown);

        publisher.publish(&upsert("o1", 1)).await.unwrap();
        publisher.publish(&upsert("o1", 2)).await.unwrap();
        publisher.publish(&delete("o2", 1)).await.unwrap();

        wait_for(|| cache.get("o1").map(|o| o.version) == Some(2)).await;

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
