//! Pipeline orchestrator - coordinates all components.
//!
//! Builds the sensor manager, detection engine, telemetry queues, and daily
//! counter from the blueprint, then drives the poll loop until the duration
//! or event limit is reached (or the caller cancels).

use std::sync::PoisonError;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{
    AppBlueprint, EventRecord, Notifier, SensorKind, SensorSource, SourceMode, StatusReport,
    StreamSnapshot, TelemetryItem, TelemetryPoint,
};
use detection_engine::DetectionEngine;
use ingestion::{shared_buffer, snapshot_of, BufferHandle, PushSource, SensorManager,
    SimulatedSource, SimulatedSourceConfig};
use observability::{record_event_metrics, record_stream_rate, DetectionMetricsAggregator};
use telemetry::queue::{create_queue, submit_all};
use telemetry::{DailyCounter, TelemetryQueue};
use tracing::{info, warn};

use crate::notify::LogNotifier;

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The application blueprint
    pub blueprint: AppBlueprint,

    /// Run duration (None = until cancelled)
    pub duration: Option<Duration>,

    /// Maximum confirmed events to process (None = unlimited)
    pub max_events: Option<u64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup sensor streams
        info!("Setting up sensor streams...");
        let mut manager = SensorManager::new();
        for stream in &blueprint.streams {
            let source: Box<dyn SensorSource> = match stream.source {
                SourceMode::Simulated => Box::new(SimulatedSource::new(SimulatedSourceConfig {
                    stream_id: stream.id.clone(),
                    kind: stream.kind,
                    rate_hz: stream.sample_rate_hz,
                    buffer_capacity: stream.buffer_capacity,
                    amplitude: stream.sim_amplitude,
                })),
                SourceMode::Push => {
                    warn!(
                        stream_id = %stream.id,
                        "push stream registered without an external driver; it will stay cold"
                    );
                    Box::new(PushSource::new(
                        stream.id.as_str(),
                        stream.kind,
                        stream.sample_rate_hz,
                        stream.buffer_capacity,
                    ))
                }
            };
            manager.register(source);
        }

        let accel_buffer = manager
            .buffer_of_kind(SensorKind::Accelerometer)
            .context("blueprint has no accelerometer stream")?;

        // Orientation context: a native orientation stream, or a local
        // buffer fed by fusing accelerometer + magnetometer per tick
        let magnetometer_buffer = manager.buffer_of_kind(SensorKind::Magnetometer);
        let (orientation_buffer, fuse_orientation) =
            match manager.buffer_of_kind(SensorKind::Orientation) {
                Some(buffer) => (buffer, false),
                None => {
                    let capacity = blueprint
                        .stream_of_kind(SensorKind::Magnetometer)
                        .map(|s| s.buffer_capacity)
                        .unwrap_or(200);
                    info!("no orientation stream; fusing accelerometer + magnetometer");
                    (shared_buffer(capacity, "orientation_fused".into()), true)
                }
            };

        // Setup telemetry
        info!("Setting up telemetry queues...");
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - confirmed events will only be logged");
        }
        let mut queues = Vec::with_capacity(blueprint.sinks.len());
        for sink_config in &blueprint.sinks {
            let queue = create_queue(sink_config)
                .with_context(|| format!("Failed to create sink '{}'", sink_config.name))?;
            queues.push(queue);
        }

        let mut counter = DailyCounter::load(&blueprint.device.counter_path);
        let notifier = LogNotifier::new();

        // Setup detection engine
        let mut engine = DetectionEngine::new(
            blueprint.detector.clone(),
            blueprint.align,
            blueprint.fusion,
        );
        let mut aggregator = DetectionMetricsAggregator::new();

        info!(
            event_thresh = blueprint.detector.event_thresh,
            std_max = blueprint.detector.std_max,
            cooldown_s = blueprint.detector.cooldown_s,
            poll_rate_hz = blueprint.poll.poll_rate_hz,
            "Detection engine configured"
        );

        // Start producers
        manager.enable_all();

        let mut stats = PipelineStats {
            active_streams: manager.stream_count(),
            active_sinks: queues.len(),
            ..Default::default()
        };

        let deadline = self.config.duration.map(|d| start_time + d);
        let mut poll_tick =
            tokio::time::interval(Duration::from_secs_f64(1.0 / blueprint.poll.poll_rate_hz));
        let mut status_tick =
            tokio::time::interval(Duration::from_secs_f64(blueprint.poll.status_interval_s));

        info!(
            duration = ?self.config.duration,
            max_events = ?self.config.max_events,
            "Pipeline running"
        );

        loop {
            if deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
                info!("Run duration reached");
                break;
            }

            tokio::select! {
                _ = poll_tick.tick() => {
                    stats.polls += 1;
                    let accel = snapshot_of(&accel_buffer);

                    if fuse_orientation {
                        if let Some(mag_buffer) = &magnetometer_buffer {
                            let mag = snapshot_of(mag_buffer);
                            if let Some(sample) = engine.fuse_tick(&accel, &mag) {
                                push_sample(&orientation_buffer, sample);
                                stats.fused_samples += 1;
                            }
                        }
                    }

                    let orientation = snapshot_of(&orientation_buffer);
                    let outcome = engine.poll(&accel, &orientation);
                    aggregator.update_rejected(engine.candidates_rejected());
                    stats.candidates_rejected = engine.candidates_rejected();

                    if let Some(event) = outcome.event {
                        let today_count = counter.register_event();
                        stats.events_confirmed += 1;

                        record_event_metrics(&event, outcome.alignment.as_ref());
                        aggregator.update_event(&event, outcome.alignment.as_ref());

                        notifier.notify(
                            "Shot detected",
                            &format!(
                                "axis {}, {:.1} m/s², #{today_count} today",
                                event.peak_axis, event.peak_magnitude
                            ),
                        );

                        // Event point plus the surrounding sensor context
                        submit_all(
                            &queues,
                            &TelemetryItem::Point(event_point(
                                &event,
                                &blueprint.device.id,
                                today_count,
                            )),
                        );
                        submit_all(
                            &queues,
                            &TelemetryItem::Batch(context_batch(&accel, &blueprint.device.id)),
                        );

                        if self
                            .config
                            .max_events
                            .map(|max| stats.events_confirmed >= max)
                            .unwrap_or(false)
                        {
                            info!(events = stats.events_confirmed, "Reached max events limit");
                            break;
                        }
                    }
                }
                _ = status_tick.tick() => {
                    let report = StatusReport {
                        stream_rates: manager.rates(),
                        accuracy: accel_accuracy(&accel_buffer),
                        event_count: counter.count(),
                    };
                    for (stream_id, rate) in &report.stream_rates {
                        record_stream_rate(stream_id.as_str(), *rate);
                    }
                    notifier.status(&report);
                }
            }
        }

        // Shutdown
        info!("Shutting down pipeline...");
        manager.disable_all();
        Self::shutdown_queues(queues).await;

        stats.duration = start_time.elapsed();
        stats.detection_metrics = aggregator;

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            events = stats.events_confirmed,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }

    async fn shutdown_queues(queues: Vec<TelemetryQueue>) {
        for queue in queues {
            queue.shutdown().await;
        }
    }
}

fn push_sample(buffer: &BufferHandle, sample: contracts::Sample) {
    buffer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(sample);
}

fn accel_accuracy(buffer: &BufferHandle) -> u8 {
    buffer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .accuracy()
}

/// Build the telemetry point for a confirmed event.
///
/// Angles leave the pipeline in degrees; this is the reporting boundary.
fn event_point(event: &EventRecord, device_id: &str, today_count: u64) -> TelemetryPoint {
    let mut point = TelemetryPoint::new("shot", event.event_time_ns)
        .tag("device", device_id)
        .field("peak_magnitude", event.peak_magnitude)
        .field("peak_axis", event.peak_axis as f64)
        .field("std_azimuth", event.std_per_axis[0])
        .field("std_pitch", event.std_per_axis[1])
        .field("std_roll", event.std_per_axis[2])
        .field("daily_count", today_count as f64);

    if let Some(orientation) = event.orientation_at_event {
        point = point
            .field("azimuth_deg", orientation[0].to_degrees())
            .field("pitch_deg", orientation[1].to_degrees())
            .field("roll_deg", orientation[2].to_degrees());
    }

    point
}

/// Build the post-event context dump: one point per real accelerometer
/// sample in the snapshot (pre-fill entries are skipped).
fn context_batch(accel: &StreamSnapshot, device_id: &str) -> Vec<TelemetryPoint> {
    let mut points = Vec::with_capacity(accel.len());
    for (index, &timestamp_ns) in accel.timestamps.iter().enumerate() {
        if timestamp_ns == 0 {
            continue;
        }
        points.push(
            TelemetryPoint::new("shot_context", timestamp_ns)
                .tag("device", device_id)
                .field("x", accel.axes[0][index])
                .field("y", accel.axes[1][index])
                .field("z", accel.axes[2][index]),
        );
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_prefill() -> StreamSnapshot {
        StreamSnapshot {
            axes: [
                vec![0.0, 0.0, 1.0, 2.0],
                vec![0.0, 0.0, 3.0, 4.0],
                vec![0.0, 0.0, 5.0, 6.0],
            ],
            timestamps: vec![0, 0, 1_000, 2_000],
            rate_hz: 250.0,
            accuracy: 3,
        }
    }

    #[test]
    fn context_batch_skips_prefill_entries() {
        let batch = context_batch(&snapshot_with_prefill(), "unit-1");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].timestamp_ns, 1_000);
        assert_eq!(batch[1].fields[0], ("x".to_string(), 2.0));
    }

    #[test]
    fn event_point_reports_degrees_at_boundary() {
        let event = EventRecord {
            event_time_ns: 1_000_000_000,
            peak_axis: 0,
            peak_magnitude: 80.0,
            orientation_at_event: Some([std::f64::consts::PI, 0.0, -std::f64::consts::FRAC_PI_2]),
            std_per_axis: [0.01, 0.02, 0.03],
        };

        let point = event_point(&event, "unit-1", 3);
        let azimuth = point
            .fields
            .iter()
            .find(|(k, _)| k == "azimuth_deg")
            .unwrap()
            .1;
        let roll = point.fields.iter().find(|(k, _)| k == "roll_deg").unwrap().1;

        assert!((azimuth - 180.0).abs() < 1e-9);
        assert!((roll + 90.0).abs() < 1e-9);
        assert_eq!(point.tags[0], ("device".to_string(), "unit-1".to_string()));
    }

    #[test]
    fn event_point_without_orientation_omits_angles() {
        let event = EventRecord {
            event_time_ns: 1,
            peak_axis: 2,
            peak_magnitude: 61.0,
            orientation_at_event: None,
            std_per_axis: [0.0; 3],
        };

        let point = event_point(&event, "unit-1", 1);
        assert!(!point.fields.iter().any(|(k, _)| k.ends_with("_deg")));
    }
}
