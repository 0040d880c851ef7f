//! # Detection Engine
//!
//! Turns buffered sensor snapshots into confirmed events.
//!
//! Responsibilities:
//! - timestamp alignment between independently clocked streams
//! - orientation fusion (accelerometer + magnetometer, or rotation vector)
//! - threshold + debounce + stability-gated event detection
//! - the poll-cycle driver combining the above
//!
//! ## Usage
//!
//! ```ignore
//! use detection_engine::DetectionEngine;
//!
//! let mut engine = DetectionEngine::new(detector_cfg, align_cfg, fusion_cfg);
//!
//! // Per poll tick, with lock-free snapshots of both streams:
//! let outcome = engine.poll(&accel_snapshot, &orientation_snapshot);
//! if let Some(event) = outcome.event {
//!     // register + forward to telemetry
//! }
//! ```

mod align;
mod detector;
mod engine;
mod orientation;
mod stats;

pub use align::align;
pub use detector::{Candidate, DetectorState, EventDetector, GateOutcome};
pub use engine::{DetectionEngine, PollOutcome};
pub use orientation::{from_rotation_vector, fuse, gravity_estimate};
pub use stats::{estimate_rate_hz, mean, std_dev, window_len};

// Re-export contracts types
pub use contracts::{
    AlignConfidence, AlignConfig, Alignment, DetectorConfig, EventRecord, FusionConfig,
    StreamSnapshot,
};
