//! # Telemetry
//!
//! Outbound telemetry layer.
//!
//! Responsibilities:
//! - decouple detection (latency-sensitive) from outbound I/O
//!   (network-latency-bound) via a single-consumer work queue
//! - point-series sinks (log, HTTP line protocol)
//! - the persisted daily event counter

pub mod counter;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod sinks;

pub use contracts::{TelemetryItem, TelemetryPoint, TelemetrySink};
pub use counter::DailyCounter;
pub use error::TelemetryError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use queue::{create_queue, TelemetryQueue};
pub use sinks::{HttpLineSink, LogSink};
