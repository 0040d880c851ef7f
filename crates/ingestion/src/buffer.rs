//! Per-stream sample ring buffer with rolling rate/accuracy state.
//!
//! Fixed capacity, newest overwrites oldest, no allocation after warm-up.
//! The buffer is pre-filled with zero samples so consumers never observe a
//! short buffer; detection logic recognizes zero timestamps as "not yet
//! warmed up".

use std::sync::{Arc, Mutex, PoisonError};

use contracts::{Sample, SensorEvent, StreamId, StreamSnapshot};
use ringbuf::{traits::*, HeapRb};
use tracing::debug;

use crate::rate::RateEstimator;

/// Smoothing window length for the rate estimator.
const RATE_SMOOTHING_WINDOW: usize = 5;

/// Fixed-capacity circular buffer of timestamped vector samples.
///
/// Exactly one producer pushes into a buffer (the owning sensor source);
/// the poll task copies the contents via [`SampleBuffer::snapshot`]. Both
/// run under the buffer's single exterior lock (see [`BufferHandle`]), held
/// only for the O(N) copy, never across fusion or detection work.
pub struct SampleBuffer {
    ring: HeapRb<Sample>,
    capacity: usize,
    rate: RateEstimator,
    accuracy: u8,
    last_timestamp: Option<i64>,
    out_of_order_count: u64,
    label: Option<StreamId>,
}

impl SampleBuffer {
    /// Create a buffer of fixed `capacity`, pre-filled with zero samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let mut ring = HeapRb::new(capacity);
        for _ in 0..capacity {
            let _ = ring.try_push(Sample::zero());
        }

        Self {
            ring,
            capacity,
            rate: RateEstimator::new(RATE_SMOOTHING_WINDOW),
            accuracy: 0,
            last_timestamp: None,
            out_of_order_count: 0,
            label: None,
        }
    }

    /// Attach a stream id used in logs and metric tags.
    pub fn with_label(mut self, label: StreamId) -> Self {
        self.label = Some(label);
        self
    }

    /// Ring capacity fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a sample, evicting the oldest entry.
    pub fn push(&mut self, sample: Sample) {
        if let Some(last) = self.last_timestamp {
            if sample.timestamp_ns < last {
                self.out_of_order_count += 1;
            }
        }
        self.last_timestamp = Some(sample.timestamp_ns);

        self.ring.push_overwrite(sample);

        if let Some(rate) = self.rate.observe(sample.timestamp_ns) {
            if let Some(label) = &self.label {
                debug!(stream_id = %label, rate_hz = format!("{rate:.1}"), "sample rate refreshed");
                metrics::gauge!("bowsense_stream_rate_hz", "stream_id" => label.to_string())
                    .set(rate);
            }
        }
    }

    /// Apply one producer delivery (sample push or accuracy change).
    pub fn apply(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Sample(sample) => self.push(sample),
            SensorEvent::Accuracy(accuracy) => self.set_accuracy(accuracy),
        }
    }

    /// Update the platform-reported confidence level.
    pub fn set_accuracy(&mut self, accuracy: u8) {
        self.accuracy = accuracy;
    }

    /// Current smoothed sample-rate estimate (Hz).
    pub fn rate(&self) -> f64 {
        self.rate.rate_hz()
    }

    /// Current confidence level (platform convention 0-3).
    pub fn accuracy(&self) -> u8 {
        self.accuracy
    }

    /// Count of timestamp inversions observed from the producer.
    pub fn out_of_order_count(&self) -> u64 {
        self.out_of_order_count
    }

    /// Copy the full ring into an immutable snapshot.
    ///
    /// Always yields `capacity` samples, oldest first, vectors transposed
    /// into per-axis sequences.
    pub fn snapshot(&self) -> StreamSnapshot {
        let len = self.ring.occupied_len();
        let mut axes = [
            Vec::with_capacity(len),
            Vec::with_capacity(len),
            Vec::with_capacity(len),
        ];
        let mut timestamps = Vec::with_capacity(len);

        for sample in self.ring.iter() {
            axes[0].push(sample.vector[0]);
            axes[1].push(sample.vector[1]);
            axes[2].push(sample.vector[2]);
            timestamps.push(sample.timestamp_ns);
        }

        StreamSnapshot {
            axes,
            timestamps,
            rate_hz: self.rate.rate_hz(),
            accuracy: self.accuracy,
        }
    }
}

/// Shared handle to a locked sample buffer.
///
/// The one lock guards ring contents, rate counters, and the accuracy field.
pub type BufferHandle = Arc<Mutex<SampleBuffer>>;

/// Create a shared, labeled buffer handle.
pub fn shared_buffer(capacity: usize, label: StreamId) -> BufferHandle {
    Arc::new(Mutex::new(SampleBuffer::new(capacity).with_label(label)))
}

/// Take a snapshot through a handle.
///
/// The lock is held only for the copy and released before returning, so the
/// caller never computes while holding it.
pub fn snapshot_of(handle: &BufferHandle) -> StreamSnapshot {
    handle
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: i64, v: f64) -> Sample {
        Sample::new(t, [v, v + 0.5, v + 1.0])
    }

    #[test]
    fn prefilled_snapshot_is_full_length_and_cold() {
        let buffer = SampleBuffer::new(8);
        let snapshot = buffer.snapshot();

        assert_eq!(snapshot.len(), 8);
        assert!(!snapshot.is_warm());
        assert!(snapshot.timestamps.iter().all(|&t| t == 0));
    }

    #[test]
    fn ring_keeps_most_recent_in_arrival_order() {
        let capacity = 5;
        let mut buffer = SampleBuffer::new(capacity);

        // N + k pushes
        for i in 1..=12i64 {
            buffer.push(sample(i * 1_000, i as f64));
        }

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), capacity);
        assert_eq!(snapshot.timestamps, vec![8_000, 9_000, 10_000, 11_000, 12_000]);
        assert_eq!(snapshot.axes[0], vec![8.0, 9.0, 10.0, 11.0, 12.0]);
        assert!(snapshot.is_warm());
    }

    #[test]
    fn rate_converges_for_constant_producer() {
        let mut buffer = SampleBuffer::new(16);
        let rate = 100.0;
        let interval_ns = (1e9 / rate) as i64;

        for i in 0..(rate as i64 * 5) {
            buffer.push(sample(i * interval_ns, 0.0));
        }

        let reported = buffer.rate();
        assert!(
            (reported - rate).abs() / rate < 0.05,
            "expected ~{rate} Hz, got {reported}"
        );
    }

    #[test]
    fn out_of_order_push_is_counted_not_fatal() {
        let mut buffer = SampleBuffer::new(4);
        buffer.push(sample(2_000, 1.0));
        buffer.push(sample(1_000, 2.0)); // inversion
        buffer.push(sample(3_000, 3.0));

        assert_eq!(buffer.out_of_order_count(), 1);
        assert_eq!(buffer.snapshot().len(), 4);
    }

    #[test]
    fn accuracy_event_updates_field() {
        let mut buffer = SampleBuffer::new(4);
        assert_eq!(buffer.accuracy(), 0);
        buffer.apply(SensorEvent::Accuracy(3));
        assert_eq!(buffer.accuracy(), 3);
        assert_eq!(buffer.snapshot().accuracy, 3);
    }

    #[test]
    fn handle_snapshot_copies_under_lock() {
        let handle = shared_buffer(4, "accel".into());
        handle
            .lock()
            .unwrap()
            .push(sample(1_000, 7.0));

        let snapshot = snapshot_of(&handle);
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.axes[0][3], 7.0);
    }
}
