//! Queue/sink metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single telemetry queue and its sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Current queue depth (approximate, sampled by the consumer)
    queue_len: AtomicUsize,
    /// Total items submitted
    submitted_count: AtomicU64,
    /// Total points successfully written
    write_count: AtomicU64,
    /// Total write failures (item dropped)
    failure_count: AtomicU64,
    /// Total items dropped because the worker was gone
    dropped_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue depth
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current queue depth
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get submitted item count
    pub fn submitted_count(&self) -> u64 {
        self.submitted_count.load(Ordering::Relaxed)
    }

    /// Increment submitted item count
    pub fn inc_submitted_count(&self) {
        self.submitted_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get written point count
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Add written points
    pub fn add_write_count(&self, points: u64) {
        self.write_count.fetch_add(points, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get dropped count
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Increment dropped count
    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            submitted_count: self.submitted_count(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of queue metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub submitted_count: u64,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}
