//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Monotonic sensor timestamps in nanoseconds (`i64`) are the primary clock
//! - Timestamps originate in the producer's clock domain; wall-clock time is
//!   only used at the daily-counter and telemetry reporting boundaries

mod align;
mod blueprint;
mod error;
mod event;
mod notify;
mod point;
mod sample;
mod sensor_source;
mod sink;
mod stream_id;

pub use align::*;
pub use blueprint::*;
pub use error::*;
pub use event::*;
pub use notify::Notifier;
pub use point::*;
pub use sample::*;
pub use sensor_source::{SensorEvent, SensorEventCallback, SensorSource};
pub use sink::*;
pub use stream_id::StreamId;
