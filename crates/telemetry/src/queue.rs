//! TelemetryQueue - single-consumer work queue in front of a sink.
//!
//! Producers (detector, periodic flush triggers) enqueue without blocking;
//! one consumer task dequeues and performs the potentially slow, potentially
//! failing write. A failed write is logged and the item dropped — never
//! retried indefinitely, never blocking subsequent items, since telemetry
//! loss is preferable to detection-pipeline stalls.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{SinkConfig, SinkType, TelemetryItem, TelemetryPoint, TelemetrySink};

use crate::error::TelemetryError;
use crate::metrics::SinkMetrics;
use crate::sinks::{HttpLineSink, LogSink};

/// Handle to a running telemetry consumer
pub struct TelemetryQueue {
    /// Sink name
    name: String,
    /// Unbounded FIFO into the consumer task
    tx: mpsc::UnboundedSender<TelemetryItem>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Consumer task handle
    worker_handle: JoinHandle<()>,
}

impl TelemetryQueue {
    /// Spawn the consumer task for `sink` and return the queue handle.
    pub fn spawn<S: TelemetrySink + Send + 'static>(sink: S) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            queue_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Enqueue an item (never blocks).
    ///
    /// Returns false if the consumer is gone (item dropped).
    pub fn submit(&self, item: TelemetryItem) -> bool {
        match self.tx.send(item) {
            Ok(()) => {
                self.metrics.inc_submitted_count();
                true
            }
            Err(_) => {
                self.metrics.inc_dropped_count();
                error!(sink = %self.name, "telemetry consumer closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the consumer gracefully: drain remaining items, flush, close.
    #[instrument(name = "telemetry_queue_shutdown", skip(self))]
    pub async fn shutdown(self) {
        // Drop sender to signal the consumer to stop
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "telemetry worker panicked");
        }
        debug!(sink = %self.name, "telemetry queue shutdown complete");
    }
}

/// Consumer task: dequeue items and write to the sink
#[instrument(
    name = "telemetry_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn queue_worker<S: TelemetrySink>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<TelemetryItem>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "telemetry worker started");

    while let Some(item) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let points: Vec<TelemetryPoint> = match item {
            TelemetryItem::Point(point) => vec![point],
            TelemetryItem::Batch(points) => points,
        };
        if points.is_empty() {
            continue;
        }

        match sink.write(&points).await {
            Ok(()) => {
                metrics.add_write_count(points.len() as u64);
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(
                    sink = %name,
                    points = points.len(),
                    error = %e,
                    "telemetry write failed, item dropped"
                );
                // Continue processing - don't stall on single failure
            }
        }
    }

    // Cleanup
    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "close failed on shutdown");
    }

    debug!(sink = %name, "telemetry worker stopped");
}

/// Create a queue from sink configuration
#[instrument(
    name = "telemetry_create_queue",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_queue(config: &SinkConfig) -> Result<TelemetryQueue, TelemetryError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(TelemetryQueue::spawn(sink))
        }
        SinkType::HttpLine => {
            let sink = HttpLineSink::from_params(&config.name, &config.params)
                .map_err(|e| TelemetryError::sink_creation(&config.name, e))?;
            Ok(TelemetryQueue::spawn(sink))
        }
    }
}

/// Fan one item out to several queues.
pub fn submit_all(queues: &[TelemetryQueue], item: &TelemetryItem) {
    for queue in queues {
        if !queue.submit(item.clone()) {
            warn!(sink = queue.name(), "telemetry item dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    /// Mock sink for testing
    struct MockSink {
        name: String,
        written: Arc<AtomicU64>,
        should_fail: bool,
    }

    impl TelemetrySink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, points: &[TelemetryPoint]) -> Result<(), ContractError> {
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.written.fetch_add(points.len() as u64, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn point(i: i64) -> TelemetryPoint {
        TelemetryPoint::new("test", i).field("v", i as f64)
    }

    #[tokio::test]
    async fn queue_delivers_points_and_batches() {
        let written = Arc::new(AtomicU64::new(0));
        let queue = TelemetryQueue::spawn(MockSink {
            name: "mock".to_string(),
            written: Arc::clone(&written),
            should_fail: false,
        });

        assert!(queue.submit(TelemetryItem::Point(point(1))));
        assert!(queue.submit(TelemetryItem::Batch(vec![point(2), point(3), point(4)])));

        queue.shutdown().await;
        assert_eq!(written.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn failed_write_drops_item_and_continues() {
        let queue = TelemetryQueue::spawn(MockSink {
            name: "failing".to_string(),
            written: Arc::new(AtomicU64::new(0)),
            should_fail: true,
        });

        for i in 0..3 {
            queue.submit(TelemetryItem::Point(point(i)));
        }

        // Give the worker time to process
        sleep(Duration::from_millis(50)).await;
        assert_eq!(queue.metrics().failure_count(), 3);
        assert_eq!(queue.metrics().write_count(), 0);

        // Queue is still accepting after failures
        assert!(queue.submit(TelemetryItem::Point(point(99))));
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn submit_never_blocks_on_slow_consumer() {
        struct SlowSink {
            written: Arc<AtomicU64>,
        }
        impl TelemetrySink for SlowSink {
            fn name(&self) -> &str {
                "slow"
            }
            async fn write(&mut self, points: &[TelemetryPoint]) -> Result<(), ContractError> {
                sleep(Duration::from_millis(20)).await;
                self.written.fetch_add(points.len() as u64, Ordering::Relaxed);
                Ok(())
            }
            async fn flush(&mut self) -> Result<(), ContractError> {
                Ok(())
            }
            async fn close(&mut self) -> Result<(), ContractError> {
                Ok(())
            }
        }

        let written = Arc::new(AtomicU64::new(0));
        let queue = TelemetryQueue::spawn(SlowSink {
            written: Arc::clone(&written),
        });

        // All submissions return immediately despite the slow consumer
        for i in 0..20 {
            assert!(queue.submit(TelemetryItem::Point(point(i))));
        }
        assert_eq!(queue.metrics().submitted_count(), 20);

        // Unbounded queue: everything drains on shutdown
        queue.shutdown().await;
        assert_eq!(written.load(Ordering::Relaxed), 20);
    }

    #[tokio::test]
    async fn create_queue_from_log_config() {
        let config = SinkConfig {
            name: "test_log".to_string(),
            sink_type: SinkType::Log,
            params: Default::default(),
        };
        let queue = create_queue(&config).unwrap();
        assert!(queue.submit(TelemetryItem::Point(point(1))));
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn create_http_queue_requires_url() {
        let config = SinkConfig {
            name: "influx".to_string(),
            sink_type: SinkType::HttpLine,
            params: Default::default(),
        };
        assert!(matches!(
            create_queue(&config),
            Err(TelemetryError::SinkCreation { .. })
        ));
    }
}
