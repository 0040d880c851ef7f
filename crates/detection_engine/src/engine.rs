//! Poll-cycle driver: snapshots in, confirmed events out.

use contracts::{
    AlignConfidence, AlignConfig, Alignment, DetectorConfig, EventRecord, FusionConfig, Sample,
    StreamSnapshot,
};
use tracing::{debug, info, instrument};

use crate::align::align;
use crate::detector::EventDetector;
use crate::orientation::{fuse, gravity_estimate};

/// Result of one poll tick.
#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    /// Confirmed event, at most one per tick
    pub event: Option<EventRecord>,

    /// Alignment diagnostics for the confirmed event's orientation context
    pub alignment: Option<Alignment>,
}

/// Detection pipeline driver.
///
/// Owns the detector state machine and the alignment/fusion tuning; called
/// once per poll tick with lock-free snapshots of both streams. Holds no
/// lock at any point.
pub struct DetectionEngine {
    detector: EventDetector,
    align_config: AlignConfig,
    fusion_config: FusionConfig,
    polls: u64,
    events_confirmed: u64,
    candidates_rejected: u64,
}

impl DetectionEngine {
    /// Create an engine from the blueprint's tuning sections.
    pub fn new(detector: DetectorConfig, align: AlignConfig, fusion: FusionConfig) -> Self {
        Self {
            detector: EventDetector::new(detector),
            align_config: align,
            fusion_config: fusion,
            polls: 0,
            events_confirmed: 0,
            candidates_rejected: 0,
        }
    }

    /// Run one detection cycle.
    ///
    /// Candidate scan over the accelerometer snapshot, stability gate over
    /// the orientation snapshot, then (confirm-then-align) orientation
    /// context lookup. Degraded alignment never blocks confirmation; it is
    /// surfaced as a diagnostic only.
    #[instrument(name = "detection_poll", level = "trace", skip_all)]
    pub fn poll(&mut self, accel: &StreamSnapshot, orientation: &StreamSnapshot) -> PollOutcome {
        self.polls += 1;

        let Some(candidate) = self.detector.scan(accel) else {
            return PollOutcome::default();
        };

        // The stability gate needs real orientation data; a cold stream
        // means the device is not ready and the candidate is discarded.
        if !orientation.is_warm() {
            debug!(
                event_time_ns = candidate.event_time_ns,
                "candidate discarded: orientation stream not warmed up"
            );
            self.candidates_rejected += 1;
            return PollOutcome::default();
        }

        let gate = self.detector.gate(orientation);
        if !gate.pass {
            self.candidates_rejected += 1;
            metrics::counter!("bowsense_candidates_rejected_total", "reason" => "unstable")
                .increment(1);
            debug!(
                event_time_ns = candidate.event_time_ns,
                std_per_axis = ?gate.std_per_axis,
                "candidate discarded: stability gate"
            );
            return PollOutcome::default();
        }

        self.detector.confirm(&candidate);
        self.events_confirmed += 1;
        metrics::counter!("bowsense_events_total").increment(1);

        let alignment = align(
            candidate.event_time_ns,
            &orientation.timestamps,
            &self.align_config,
        );

        // A window-expired alignment means the orientation ring no longer
        // covers the event at all; its sample is not trustworthy context.
        let orientation_at_event = match alignment.confidence {
            AlignConfidence::WindowExpired => None,
            _ => orientation.vector_at(alignment.index),
        };

        info!(
            event_time_ns = candidate.event_time_ns,
            peak_axis = candidate.peak_axis,
            peak_magnitude = format!("{:.2}", candidate.peak_magnitude),
            align_confidence = alignment.confidence.label(),
            "event confirmed"
        );

        PollOutcome {
            event: Some(EventRecord {
                event_time_ns: candidate.event_time_ns,
                peak_axis: candidate.peak_axis,
                peak_magnitude: candidate.peak_magnitude,
                orientation_at_event,
                std_per_axis: gate.std_per_axis,
            }),
            alignment: Some(alignment),
        }
    }

    /// Dual-sensor fusion tick: gravity estimate + latest magnetometer
    /// sample into one orientation sample, for pipelines without a fused
    /// rotation-vector stream.
    ///
    /// Returns `None` while either stream is cold or the vectors are
    /// degenerate; the caller skips producing an orientation sample for
    /// this tick rather than substituting a default.
    pub fn fuse_tick(
        &self,
        accel: &StreamSnapshot,
        magnetometer: &StreamSnapshot,
    ) -> Option<Sample> {
        if !accel.is_warm() || !magnetometer.is_warm() {
            return None;
        }

        let gravity = gravity_estimate(accel, self.fusion_config.gravity_window);
        let geomagnetic = magnetometer.vector_at(magnetometer.len() - 1)?;
        let angles = fuse(gravity, geomagnetic)?;

        Some(Sample::new(magnetometer.newest_timestamp()?, angles))
    }

    /// Poll ticks executed.
    pub fn poll_count(&self) -> u64 {
        self.polls
    }

    /// Events confirmed since construction.
    pub fn events_confirmed(&self) -> u64 {
        self.events_confirmed
    }

    /// Candidates rejected by the stability gate or cold streams.
    pub fn candidates_rejected(&self) -> u64 {
        self.candidates_rejected
    }
}
