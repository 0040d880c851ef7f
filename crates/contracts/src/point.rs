//! TelemetryPoint - the opaque point-series sink input

use serde::{Deserialize, Serialize};

/// One point in a named measurement series.
///
/// The telemetry sink accepts a measurement name, a numeric field set, a set
/// of string tags (including a stable per-device identifier), and a
/// nanosecond timestamp. Wire encoding is a sink concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    /// Measurement name (e.g. "shot", "orientation")
    pub measurement: String,

    /// String tags, applied in order
    pub tags: Vec<(String, String)>,

    /// Numeric field set; at least one field is required by the sink
    pub fields: Vec<(String, f64)>,

    /// Point timestamp in nanoseconds
    pub timestamp_ns: i64,
}

impl TelemetryPoint {
    /// Start building a point for `measurement` at `timestamp_ns`.
    pub fn new(measurement: impl Into<String>, timestamp_ns: i64) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp_ns,
        }
    }

    /// Add a string tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Add a numeric field.
    pub fn field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.push((key.into(), value));
        self
    }
}

/// Work item accepted by the telemetry queue.
#[derive(Debug, Clone)]
pub enum TelemetryItem {
    /// Single point (confirmed event, status sample)
    Point(TelemetryPoint),

    /// Batched points (post-event context dump); preferred for bulk uploads
    Batch(Vec<TelemetryPoint>),
}

impl TelemetryItem {
    /// Number of points carried by this item.
    pub fn point_count(&self) -> usize {
        match self {
            TelemetryItem::Point(_) => 1,
            TelemetryItem::Batch(points) => points.len(),
        }
    }
}
