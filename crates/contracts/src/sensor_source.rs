//! SensorSource trait - Sensor data source abstraction
//!
//! Defines a unified interface for sensor data sources, decoupling the
//! sampling layer from concrete producers. Live platform-driven sensors and
//! simulated generators implement the same trait so the rest of the pipeline
//! is source-agnostic.

use std::sync::Arc;

use crate::{Sample, SensorKind, StreamId};

/// One delivery from a sensor source.
///
/// Platforms report samples and accuracy changes through separate callbacks;
/// both arrive through the same channel here so the buffer can be updated
/// under a single lock acquisition.
#[derive(Debug, Clone, Copy)]
pub enum SensorEvent {
    /// A new timestamped reading
    Sample(Sample),

    /// Sensor confidence changed (platform convention 0-3)
    Accuracy(u8),
}

/// Sensor event callback type.
///
/// Uses `Arc` to allow callback sharing across delivery contexts. The
/// callback runs on the producer's delivery thread and must complete in
/// bounded, short time: no blocking I/O, no allocation beyond amortized ring
/// insertion.
pub type SensorEventCallback = Arc<dyn Fn(SensorEvent) + Send + Sync>;

/// Sensor data source trait.
///
/// Abstracts the common behavior of live (platform push) and simulated
/// sensor producers.
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn SensorSource> = make_source();
/// source.enable(Arc::new(|event| {
///     // push into the stream's buffer
/// }));
/// // ... sample ...
/// source.disable();
/// ```
pub trait SensorSource: Send + Sync {
    /// Stream identifier this source feeds.
    fn stream_id(&self) -> &StreamId;

    /// Kind of physical stream produced.
    fn kind(&self) -> SensorKind;

    /// Nominal sample rate the source is configured for (Hz).
    fn default_sample_rate(&self) -> f64;

    /// Ring capacity the stream's buffer should be constructed with.
    fn buffer_capacity(&self) -> usize;

    /// Start producing events into `callback`.
    ///
    /// Repeated calls while already enabled are idempotent (the original
    /// callback stays installed).
    fn enable(&self, callback: SensorEventCallback);

    /// Stop producing.
    ///
    /// Idempotent and safe to call when never enabled. Signals the producer
    /// to stop; one final in-flight event after `disable` returns is
    /// acceptable and must not corrupt buffer state.
    fn disable(&self);

    /// Check whether the source is currently producing.
    fn is_enabled(&self) -> bool;
}
