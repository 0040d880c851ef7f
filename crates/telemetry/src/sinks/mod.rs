//! Telemetry sink implementations

mod http;
mod log;

pub use http::{encode_line_protocol, HttpLineSink};
pub use log::LogSink;
