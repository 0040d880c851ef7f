//! Live push boundary.
//!
//! Platform sensor registration is out of scope; `PushSource` is the seam
//! where an external delivery thread hands samples in. The platform adapter
//! holds a [`PushHandle`] and calls [`PushHandle::deliver`] once per physical
//! sample, on its own thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{SensorEvent, SensorEventCallback, SensorKind, SensorSource, StreamId};
use tracing::debug;

type CallbackSlot = Arc<Mutex<Option<SensorEventCallback>>>;

/// Externally driven sensor source.
pub struct PushSource {
    stream_id: StreamId,
    kind: SensorKind,
    rate_hz: f64,
    buffer_capacity: usize,
    slot: CallbackSlot,
    enabled: Arc<AtomicBool>,
}

impl PushSource {
    /// Create a push source for the given stream.
    pub fn new(stream_id: &str, kind: SensorKind, rate_hz: f64, buffer_capacity: usize) -> Self {
        Self {
            stream_id: stream_id.into(),
            kind,
            rate_hz,
            buffer_capacity,
            slot: Arc::new(Mutex::new(None)),
            enabled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for the external delivery thread.
    pub fn handle(&self) -> PushHandle {
        PushHandle {
            slot: Arc::clone(&self.slot),
            enabled: Arc::clone(&self.enabled),
        }
    }
}

impl SensorSource for PushSource {
    fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn default_sample_rate(&self) -> f64 {
        self.rate_hz
    }

    fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    fn enable(&self, callback: SensorEventCallback) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(callback);
        }
        drop(slot);
        self.enabled.store(true, Ordering::SeqCst);
        debug!(stream_id = %self.stream_id, "push source enabled");
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        // Drop the callback so the buffer behind it can be released
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

/// Delivery handle held by the external platform adapter.
#[derive(Clone)]
pub struct PushHandle {
    slot: CallbackSlot,
    enabled: Arc<AtomicBool>,
}

impl PushHandle {
    /// Deliver one event from the platform thread.
    ///
    /// Returns false when the source is disabled (the event is dropped).
    /// The callback is cloned out of the slot before invocation so the slot
    /// lock is never held during the buffer push.
    pub fn deliver(&self, event: SensorEvent) -> bool {
        if !self.enabled.load(Ordering::Relaxed) {
            return false;
        }

        let callback = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match callback {
            Some(callback) => {
                callback(event);
                true
            }
            None => false,
        }
    }
}
