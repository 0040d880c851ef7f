//! AppBlueprint - Config Loader output
//!
//! Describes the complete application configuration: device identity, sensor
//! streams, detection thresholds, alignment/fusion tuning, poll cadence, and
//! telemetry output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{SensorKind, StreamId};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete application configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Device identity and persistence paths
    #[validate(nested)]
    pub device: DeviceConfig,

    /// Sensor stream definitions
    #[validate(nested)]
    pub streams: Vec<StreamConfig>,

    /// Event detector tuning
    #[serde(default)]
    #[validate(nested)]
    pub detector: DetectorConfig,

    /// Stream alignment tuning
    #[serde(default)]
    pub align: AlignConfig,

    /// Orientation fusion tuning
    #[serde(default)]
    #[validate(nested)]
    pub fusion: FusionConfig,

    /// Poll/status cadence
    #[serde(default)]
    #[validate(nested)]
    pub poll: PollConfig,

    /// Telemetry output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl AppBlueprint {
    /// Find a stream definition by id.
    pub fn stream(&self, id: &str) -> Option<&StreamConfig> {
        self.streams.iter().find(|s| s.id == id)
    }

    /// First stream of the given kind, if configured.
    pub fn stream_of_kind(&self, kind: SensorKind) -> Option<&StreamConfig> {
        self.streams.iter().find(|s| s.kind == kind)
    }
}

/// Device identity and persistence paths
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeviceConfig {
    /// Stable per-device identifier, attached as a telemetry tag
    #[validate(length(min = 1))]
    pub id: String,

    /// Path of the persisted daily event counter file
    #[serde(default = "default_counter_path")]
    pub counter_path: String,
}

fn default_counter_path() -> String {
    "daily_events.json".to_string()
}

/// How a stream's producer is realized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Synthetic generator task (desktop testing, no hardware)
    #[default]
    Simulated,

    /// Externally driven push boundary (platform sensor delivery thread)
    Push,
}

/// One sensor stream definition
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StreamConfig {
    /// Unique stream identifier
    pub id: StreamId,

    /// Kind of physical stream
    pub kind: SensorKind,

    /// Nominal sample rate (Hz), must be > 0
    #[validate(range(min = 0.001))]
    pub sample_rate_hz: f64,

    /// Ring buffer capacity, fixed at stream-enable time
    #[validate(range(min = 2))]
    pub buffer_capacity: usize,

    /// Producer realization
    #[serde(default)]
    pub source: SourceMode,

    /// Peak amplitude for simulated acceleration vectors (m/s²)
    #[serde(default = "default_sim_amplitude")]
    pub sim_amplitude: f64,
}

fn default_sim_amplitude() -> f64 {
    20.0
}

/// Event detector tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetectorConfig {
    /// Absolute per-axis peak threshold (m/s²)
    #[validate(range(min = 0.001))]
    pub event_thresh: f64,

    /// Maximum adjusted per-axis orientation std over the stability window
    #[validate(range(min = 0.000001))]
    pub std_max: f64,

    /// Stability window length (milliseconds of orientation samples)
    #[validate(range(min = 1))]
    pub std_window_ms: u64,

    /// Minimum elapsed time between confirmed events (seconds)
    #[validate(range(min = 0.0))]
    pub cooldown_s: f64,

    /// Per-axis resolution-adjustment divisors applied before the std check
    pub axis_divisors: [f64; 3],
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            event_thresh: 60.0,
            std_max: 0.2,
            std_window_ms: 400,
            cooldown_s: 5.0,
            axis_divisors: [1.0, 1.0, 1.0],
        }
    }
}

/// Stream alignment tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Fixed backward offset (samples) applied to the resolved index to
    /// exclude samples contaminated by post-impulse ringing
    pub backoff_samples: usize,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self { backoff_samples: 3 }
    }
}

/// Orientation fusion tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct FusionConfig {
    /// Number of recent accelerometer samples averaged into the gravity
    /// estimate for the dual-sensor path
    #[validate(range(min = 1))]
    pub gravity_window: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { gravity_window: 8 }
    }
}

/// Poll/status cadence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct PollConfig {
    /// Detection poll rate (Hz)
    #[validate(range(min = 0.001))]
    pub poll_rate_hz: f64,

    /// Status report interval (seconds)
    #[validate(range(min = 0.1))]
    pub status_interval_s: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_rate_hz: 6.0,
            status_interval_s: 1.0,
        }
    }
}

/// Telemetry sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log point summaries via tracing
    Log,

    /// HTTP line-protocol writes to an InfluxDB-compatible endpoint
    HttpLine,
}

/// Telemetry sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name (logging/metrics label)
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Sink-specific parameters (url, database, token, ...)
    #[serde(default)]
    pub params: HashMap<String, String>,
}
