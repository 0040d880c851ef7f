//! # Ingestion
//!
//! Sensor sampling layer: fixed-capacity ring buffers fed by asynchronous
//! producer callbacks, rolling rate/accuracy tracking, and the producer
//! implementations (simulated generator, live push boundary).
//!
//! Producers push under the buffer's own lock; consumers take lock-free
//! snapshots for downstream fusion and detection. The `SensorManager` owns
//! the source/buffer pairs and their enable/disable lifecycle.

mod buffer;
mod manager;
mod push;
mod rate;
mod simulated;

pub use buffer::{shared_buffer, snapshot_of, BufferHandle, SampleBuffer};
pub use manager::SensorManager;
pub use push::{PushHandle, PushSource};
pub use rate::RateEstimator;
pub use simulated::{SimulatedSource, SimulatedSourceConfig};

// Re-export contracts types used at this boundary
pub use contracts::{Sample, SensorEvent, SensorKind, SensorSource, StreamId, StreamSnapshot};
