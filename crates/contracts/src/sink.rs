//! TelemetrySink trait - telemetry queue output interface
//!
//! Defines the abstract interface for point-series sinks.

use crate::{ContractError, TelemetryPoint};

/// Point-series output trait.
///
/// All sink implementations must implement this trait. Writes are
/// best-effort: a failed write is logged and dropped by the consumer loop,
/// never retried indefinitely.
#[trait_variant::make(TelemetrySink: Send)]
pub trait LocalTelemetrySink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write a batch of points.
    ///
    /// Single points arrive as one-element slices; bulk context dumps as
    /// larger batches.
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, points: &[TelemetryPoint]) -> Result<(), ContractError>;

    /// Flush buffered output (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
