//! LogSink - logs point summaries via tracing

use contracts::{ContractError, TelemetryPoint, TelemetrySink};
use tracing::{info, instrument};

/// Sink that logs point summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, points: &[TelemetryPoint]) {
        let first = &points[0];
        info!(
            sink = %self.name,
            measurement = %first.measurement,
            points = points.len(),
            timestamp_ns = first.timestamp_ns,
            "telemetry batch received"
        );
    }
}

impl TelemetrySink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, points),
        fields(sink = %self.name, points = points.len())
    )]
    async fn write(&mut self, points: &[TelemetryPoint]) -> Result<(), ContractError> {
        if !points.is_empty() {
            self.log_batch_summary(points);
        }
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
