//! Simulated sensor source.
//!
//! Synthetic generator for desktop testing without sensor hardware. Must
//! reproduce the same buffer/rate contract as a live source so the rest of
//! the pipeline is source-agnostic.

use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{Sample, SensorEvent, SensorEventCallback, SensorKind, SensorSource, StreamId};
use tracing::debug;

/// Simulated source configuration.
#[derive(Debug, Clone)]
pub struct SimulatedSourceConfig {
    /// Stream identifier
    pub stream_id: StreamId,

    /// Kind of stream to synthesize
    pub kind: SensorKind,

    /// Producer rate (Hz)
    pub rate_hz: f64,

    /// Ring capacity the stream's buffer should use
    pub buffer_capacity: usize,

    /// Peak amplitude for vector components (m/s² or µT)
    pub amplitude: f64,
}

impl Default for SimulatedSourceConfig {
    fn default() -> Self {
        Self {
            stream_id: "sim".into(),
            kind: SensorKind::Accelerometer,
            rate_hz: 100.0,
            buffer_capacity: 500,
            amplitude: 20.0,
        }
    }
}

/// Simulated sensor source.
///
/// A dedicated task sleeps for `1/rate_hz`, synthesizes a plausible vector,
/// and delivers it through the callback: uniform-random within the
/// configured amplitude for acceleration/magnetic streams, uniform-random
/// within physically-motivated angular ranges for orientation streams.
pub struct SimulatedSource {
    config: SimulatedSourceConfig,
    running: Arc<AtomicBool>,
}

impl SimulatedSource {
    /// Create a new simulated source.
    pub fn new(config: SimulatedSourceConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Convenience constructor for an accelerometer stream.
    pub fn accelerometer(stream_id: &str, rate_hz: f64, capacity: usize, amplitude: f64) -> Self {
        Self::new(SimulatedSourceConfig {
            stream_id: stream_id.into(),
            kind: SensorKind::Accelerometer,
            rate_hz,
            buffer_capacity: capacity,
            amplitude,
        })
    }

    /// Convenience constructor for an orientation stream.
    pub fn orientation(stream_id: &str, rate_hz: f64, capacity: usize) -> Self {
        Self::new(SimulatedSourceConfig {
            stream_id: stream_id.into(),
            kind: SensorKind::Orientation,
            rate_hz,
            buffer_capacity: capacity,
            ..Default::default()
        })
    }

    fn synthesize(kind: SensorKind, amplitude: f64) -> [f64; 3] {
        match kind {
            SensorKind::Accelerometer | SensorKind::Magnetometer => [
                rand::random_range(-amplitude..=amplitude),
                rand::random_range(-amplitude..=amplitude),
                rand::random_range(-amplitude..=amplitude),
            ],
            // Azimuth and roll cover the full circle, pitch only ±90°
            SensorKind::Orientation => [
                rand::random_range(-PI..=PI),
                rand::random_range(-FRAC_PI_2..=FRAC_PI_2),
                rand::random_range(-PI..=PI),
            ],
        }
    }
}

impl SensorSource for SimulatedSource {
    fn stream_id(&self) -> &StreamId {
        &self.config.stream_id
    }

    fn kind(&self) -> SensorKind {
        self.config.kind
    }

    fn default_sample_rate(&self) -> f64 {
        self.config.rate_hz
    }

    fn buffer_capacity(&self) -> usize {
        self.config.buffer_capacity
    }

    fn enable(&self, callback: SensorEventCallback) {
        if self.running.swap(true, Ordering::SeqCst) {
            // Already producing
            return;
        }

        let config = self.config.clone();
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            let interval = Duration::from_secs_f64(1.0 / config.rate_hz);
            let epoch = Instant::now();

            debug!(
                stream_id = %config.stream_id,
                kind = config.kind.label(),
                rate_hz = config.rate_hz,
                "simulated source started"
            );

            // Synthetic sources are fully trusted
            callback(SensorEvent::Accuracy(3));

            while running.load(Ordering::Relaxed) {
                let timestamp_ns = epoch.elapsed().as_nanos() as i64;
                let vector = Self::synthesize(config.kind, config.amplitude);
                callback(SensorEvent::Sample(Sample::new(timestamp_ns, vector)));

                tokio::time::sleep(interval).await;
            }

            debug!(stream_id = %config.stream_id, "simulated source stopped");
        });
    }

    fn disable(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
