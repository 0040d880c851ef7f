//! SensorManager - owned stream lifecycle.
//!
//! Replaces module-level sensor-manager singletons with an explicitly
//! constructed, owned struct passed by shared-ownership handle to the poll
//! task and UI layer. Enable/disable are explicit methods with no hidden
//! module state.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use contracts::{ContractError, SensorKind, SensorSource, StreamId};
use tracing::{debug, info};

use crate::buffer::{shared_buffer, BufferHandle};

struct ManagedStream {
    source: Box<dyn SensorSource>,
    buffer: BufferHandle,
}

/// Owns the source/buffer pair of every registered stream.
#[derive(Default)]
pub struct SensorManager {
    streams: HashMap<StreamId, ManagedStream>,
}

impl SensorManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, creating its stream buffer.
    ///
    /// Returns the buffer handle for downstream snapshot consumers. The
    /// buffer capacity comes from the source's configuration.
    pub fn register(&mut self, source: Box<dyn SensorSource>) -> BufferHandle {
        let stream_id = source.stream_id().clone();
        let buffer = shared_buffer(source.buffer_capacity(), stream_id.clone());

        debug!(
            stream_id = %stream_id,
            kind = source.kind().label(),
            capacity = source.buffer_capacity(),
            "registered sensor stream"
        );

        self.streams.insert(
            stream_id,
            ManagedStream {
                source,
                buffer: Arc::clone(&buffer),
            },
        );
        buffer
    }

    /// Buffer handle of a registered stream.
    pub fn buffer(&self, stream_id: &str) -> Option<BufferHandle> {
        self.streams
            .get(stream_id)
            .map(|s| Arc::clone(&s.buffer))
    }

    /// Buffer handle of the first stream of `kind`.
    pub fn buffer_of_kind(&self, kind: SensorKind) -> Option<BufferHandle> {
        self.streams
            .values()
            .find(|s| s.source.kind() == kind)
            .map(|s| Arc::clone(&s.buffer))
    }

    /// Start one stream's producer, wiring it into the stream's buffer.
    ///
    /// Idempotent: enabling an already-enabled stream is a no-op.
    pub fn enable(&self, stream_id: &str) -> Result<(), ContractError> {
        let stream = self
            .streams
            .get(stream_id)
            .ok_or_else(|| ContractError::StreamMissing {
                stream_id: stream_id.to_string(),
            })?;

        if stream.source.is_enabled() {
            return Ok(());
        }

        let buffer = Arc::clone(&stream.buffer);
        stream.source.enable(Arc::new(move |event| {
            buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .apply(event);
        }));
        Ok(())
    }

    /// Stop one stream's producer.
    ///
    /// Idempotent and safe when the stream was never enabled.
    pub fn disable(&self, stream_id: &str) -> Result<(), ContractError> {
        let stream = self
            .streams
            .get(stream_id)
            .ok_or_else(|| ContractError::StreamMissing {
                stream_id: stream_id.to_string(),
            })?;

        stream.source.disable();
        Ok(())
    }

    /// Start every registered producer.
    pub fn enable_all(&self) {
        info!(count = self.streams.len(), "enabling all sensor streams");
        for (stream_id, stream) in &self.streams {
            if !stream.source.is_enabled() {
                debug!(stream_id = %stream_id, "enabling stream");
                let buffer = Arc::clone(&stream.buffer);
                stream.source.enable(Arc::new(move |event| {
                    buffer
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .apply(event);
                }));
            }
        }
    }

    /// Stop every registered producer.
    pub fn disable_all(&self) {
        info!(count = self.streams.len(), "disabling all sensor streams");
        for (stream_id, stream) in &self.streams {
            if stream.source.is_enabled() {
                debug!(stream_id = %stream_id, "disabling stream");
            }
            stream.source.disable();
        }
    }

    /// Current rate estimate per stream.
    pub fn rates(&self) -> Vec<(StreamId, f64)> {
        let mut rates: Vec<_> = self
            .streams
            .iter()
            .map(|(id, stream)| {
                let rate = stream
                    .buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .rate();
                (id.clone(), rate)
            })
            .collect();
        rates.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        rates
    }

    /// Number of registered streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Whether a stream's producer is currently running.
    pub fn is_enabled(&self, stream_id: &str) -> bool {
        self.streams
            .get(stream_id)
            .map(|s| s.source.is_enabled())
            .unwrap_or(false)
    }
}

impl Drop for SensorManager {
    fn drop(&mut self) {
        self.disable_all();
    }
}
