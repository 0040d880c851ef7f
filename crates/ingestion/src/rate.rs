//! Rolling sample-rate estimation in the producer's timestamp domain.

use std::collections::VecDeque;

/// Nanoseconds between rate refreshes (~1-second windows).
const RATE_INTERVAL_NS: i64 = 1_000_000_000;

/// Rolling sample-rate estimator.
///
/// Counts samples between checkpoints in the producer's own timestamp
/// domain, so hardware-timestamped and synthetic sources behave identically.
/// Instantaneous estimates are smoothed over a short moving window to reduce
/// jitter.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    count: u32,
    checkpoint_ns: i64,
    window: VecDeque<f64>,
    window_len: usize,
    rate_hz: f64,
}

impl RateEstimator {
    /// Create an estimator smoothing over up to `window_len` refreshes
    /// (clamped to 1..=10).
    pub fn new(window_len: usize) -> Self {
        Self {
            count: 0,
            checkpoint_ns: 0,
            window: VecDeque::new(),
            window_len: window_len.clamp(1, 10),
            rate_hz: 0.0,
        }
    }

    /// Record one sample at `timestamp_ns`.
    ///
    /// Returns `Some(rate)` when the estimate was refreshed (elapsed time
    /// since the checkpoint exceeded one second).
    pub fn observe(&mut self, timestamp_ns: i64) -> Option<f64> {
        if self.checkpoint_ns == 0 {
            self.checkpoint_ns = timestamp_ns;
            self.count = 0;
            return None;
        }

        let elapsed = timestamp_ns - self.checkpoint_ns;
        if elapsed < 0 {
            // Out-of-order producer race; restart the window
            self.checkpoint_ns = timestamp_ns;
            self.count = 0;
            return None;
        }

        self.count += 1;
        if elapsed <= RATE_INTERVAL_NS {
            return None;
        }

        let instant = self.count as f64 / (elapsed as f64 / 1e9);
        self.window.push_back(instant);
        while self.window.len() > self.window_len {
            self.window.pop_front();
        }
        self.rate_hz = self.window.iter().sum::<f64>() / self.window.len() as f64;

        self.count = 0;
        self.checkpoint_ns = timestamp_ns;
        Some(self.rate_hz)
    }

    /// Current smoothed estimate (Hz); 0.0 before the first refresh.
    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }
}
