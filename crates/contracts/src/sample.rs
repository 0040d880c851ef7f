//! Sample and snapshot types shared between producers and the detection path.

use serde::{Deserialize, Serialize};

/// Kind of physical sensor stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Linear acceleration, m/s² per axis, hundreds of Hz
    Accelerometer,
    /// Geomagnetic field, µT per axis
    Magnetometer,
    /// Fused azimuth/pitch/roll angles, radians, ~100 Hz
    Orientation,
}

impl SensorKind {
    /// Short label used in logs and metric tags.
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Magnetometer => "magnetometer",
            SensorKind::Orientation => "orientation",
        }
    }
}

/// One timestamped three-axis sensor reading.
///
/// Immutable once produced; created by a sensor source and copied into a
/// sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Monotonic timestamp in nanoseconds, producer clock domain
    pub timestamp_ns: i64,

    /// Per-axis values (x, y, z) or (azimuth, pitch, roll)
    pub vector: [f64; 3],
}

impl Sample {
    /// Create a sample from a timestamp and vector.
    #[inline]
    pub fn new(timestamp_ns: i64, vector: [f64; 3]) -> Self {
        Self {
            timestamp_ns,
            vector,
        }
    }

    /// The pre-fill value: timestamp 0, zero vector.
    #[inline]
    pub fn zero() -> Self {
        Self {
            timestamp_ns: 0,
            vector: [0.0; 3],
        }
    }

    /// Euclidean magnitude of the vector.
    pub fn magnitude(&self) -> f64 {
        (self.vector[0].powi(2) + self.vector[1].powi(2) + self.vector[2].powi(2)).sqrt()
    }
}

/// Immutable point-in-time copy of a sample buffer's contents.
///
/// Vectors are transposed into per-axis sequences so downstream statistics
/// can scan a single axis contiguously. Taken under the buffer's lock and
/// used lock-free thereafter.
///
/// Timestamps are non-decreasing except for rare out-of-order producer
/// races, which downstream logic tolerates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSnapshot {
    /// Per-axis value sequences, oldest first; each has `len()` entries
    pub axes: [Vec<f64>; 3],

    /// Timestamps parallel to the axis sequences
    pub timestamps: Vec<i64>,

    /// Rolling sample-rate estimate at snapshot time (Hz)
    pub rate_hz: f64,

    /// Sensor confidence level at snapshot time (platform convention 0-3)
    pub accuracy: u8,
}

impl StreamSnapshot {
    /// Number of samples in the snapshot (always the buffer capacity).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True when the snapshot holds no samples at all.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// True once at least one real sample has been pushed.
    ///
    /// Buffers are pre-filled with zero-timestamp samples; a snapshot whose
    /// newest timestamp is still zero has never seen a producer push and
    /// must be skipped by detection logic.
    pub fn is_warm(&self) -> bool {
        self.timestamps.last().is_some_and(|&t| t != 0)
    }

    /// Newest timestamp in the snapshot.
    pub fn newest_timestamp(&self) -> Option<i64> {
        self.timestamps.last().copied()
    }

    /// Sample vector at `index`, recombined from the per-axis sequences.
    pub fn vector_at(&self, index: usize) -> Option<[f64; 3]> {
        if index < self.len() {
            Some([
                self.axes[0][index],
                self.axes[1][index],
                self.axes[2][index],
            ])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sample_is_cold() {
        let snapshot = StreamSnapshot {
            axes: [vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]],
            timestamps: vec![0; 4],
            rate_hz: 0.0,
            accuracy: 0,
        };
        assert!(!snapshot.is_warm());
    }

    #[test]
    fn snapshot_warm_after_real_push() {
        let snapshot = StreamSnapshot {
            axes: [vec![0.0, 1.0], vec![0.0, 2.0], vec![0.0, 3.0]],
            timestamps: vec![0, 1_000],
            rate_hz: 100.0,
            accuracy: 3,
        };
        assert!(snapshot.is_warm());
        assert_eq!(snapshot.vector_at(1), Some([1.0, 2.0, 3.0]));
        assert_eq!(snapshot.vector_at(2), None);
    }

    #[test]
    fn sample_magnitude() {
        let s = Sample::new(1, [3.0, 4.0, 0.0]);
        assert!((s.magnitude() - 5.0).abs() < 1e-12);
    }
}
