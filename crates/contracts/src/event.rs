//! EventRecord - Detection output

use serde::{Deserialize, Serialize};

use crate::StreamId;

/// A confirmed high-energy impulse event.
///
/// Created by the event detector once a candidate passes the threshold,
/// debounce, and stability checks; consumed exactly once by the telemetry
/// queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Timestamp of the peak sample (nanoseconds, producer clock domain)
    pub event_time_ns: i64,

    /// Axis index (0..3) on which the peak was observed
    pub peak_axis: usize,

    /// Absolute peak magnitude (m/s²)
    pub peak_magnitude: f64,

    /// Orientation angles {azimuth, pitch, roll} in radians at the aligned
    /// orientation sample, when the orientation stream was warm
    pub orientation_at_event: Option<[f64; 3]>,

    /// Per-axis orientation standard deviation over the stability window,
    /// after resolution adjustment
    pub std_per_axis: [f64; 3],
}

/// Periodic status payload for the notification/UI boundary.
///
/// Fire-and-forget; never blocks the detection path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReport {
    /// Current rate estimate per stream (Hz)
    pub stream_rates: Vec<(StreamId, f64)>,

    /// Accelerometer accuracy level (platform convention 0-3)
    pub accuracy: u8,

    /// Today's confirmed event count
    pub event_count: u64,
}
