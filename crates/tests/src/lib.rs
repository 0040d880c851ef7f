//! # Integration Tests
//!
//! Cross-crate integration and end-to-end tests.
//!
//! Covers:
//! - the full detection scenario (impulse in, one confirmed event out)
//! - producer/buffer/manager lifecycle
//! - telemetry queue and daily counter integration

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        AlignConfig, DetectorConfig, FusionConfig, Sample, SensorEvent, SensorKind, SensorSource,
    };
    use detection_engine::DetectionEngine;
    use ingestion::{snapshot_of, PushSource, SensorManager, SimulatedSource};
    use telemetry::{DailyCounter, LogSink, TelemetryItem, TelemetryPoint, TelemetryQueue};

    fn engine() -> DetectionEngine {
        DetectionEngine::new(
            DetectorConfig {
                event_thresh: 60.0,
                std_max: 0.2,
                std_window_ms: 400,
                cooldown_s: 5.0,
                axis_divisors: [1.0, 1.0, 1.0],
            },
            AlignConfig::default(),
            FusionConfig::default(),
        )
    }

    /// Register an accelerometer and orientation push pair.
    fn push_pipeline() -> (
        SensorManager,
        ingestion::PushHandle,
        ingestion::PushHandle,
    ) {
        let accel = PushSource::new("accel", SensorKind::Accelerometer, 250.0, 500);
        let orientation = PushSource::new("orientation", SensorKind::Orientation, 100.0, 200);
        let accel_handle = accel.handle();
        let orientation_handle = orientation.handle();

        let mut manager = SensorManager::new();
        manager.register(Box::new(accel));
        manager.register(Box::new(orientation));
        manager.enable_all();

        (manager, accel_handle, orientation_handle)
    }

    /// End-to-end detection scenario: an all-zero accelerometer stream with
    /// one 80 m/s² sample at t=1s (threshold 60) on axis 0, followed by
    /// 300 ms of near-zero settling, against a settled orientation stream.
    /// Exactly one event confirms and the daily counter goes 0 → 1.
    #[tokio::test]
    async fn test_e2e_single_impulse() {
        let (manager, accel_handle, orientation_handle) = push_pipeline();

        // 250 Hz accelerometer: 0.0s .. 1.3s, zero except the impulse
        let impulse_ns = 1_000_000_000i64;
        let mut t = 4_000_000i64;
        while t <= 1_300_000_000 {
            let vector = if t == impulse_ns {
                [80.0, 0.0, 0.0]
            } else {
                [0.01, -0.01, 0.02]
            };
            accel_handle.deliver(SensorEvent::Sample(Sample::new(t, vector)));
            t += 4_000_000;
        }

        // 100 Hz settled orientation covering the same span
        let mut t = 10_000_000i64;
        while t <= 1_300_000_000 {
            orientation_handle.deliver(SensorEvent::Sample(Sample::new(t, [0.9, 0.05, -0.3])));
            t += 10_000_000;
        }

        let dir = tempfile::tempdir().unwrap();
        let mut counter = DailyCounter::load(dir.path().join("events.json"));
        assert_eq!(counter.count(), 0);

        let mut engine = engine();
        let accel = snapshot_of(&manager.buffer("accel").unwrap());
        let orientation = snapshot_of(&manager.buffer("orientation").unwrap());

        let outcome = engine.poll(&accel, &orientation);
        let event = outcome.event.expect("impulse should confirm");
        assert_eq!(event.peak_axis, 0);
        assert!((event.peak_magnitude - 80.0).abs() < 1e-12);
        assert_eq!(event.event_time_ns, impulse_ns);
        assert!(event.orientation_at_event.is_some());

        assert_eq!(counter.register_event(), 1);

        // Re-polling the same window yields no duplicate
        let outcome = engine.poll(&accel, &orientation);
        assert!(outcome.event.is_none());
        assert_eq!(engine.events_confirmed(), 1);

        manager.disable_all();
    }

    /// Two super-threshold impulses inside one cooldown interval confirm
    /// exactly once.
    #[tokio::test]
    async fn test_debounce_across_windows() {
        let (manager, accel_handle, orientation_handle) = push_pipeline();

        let deliver_window = |start_ns: i64, impulse_ns: i64, magnitude: f64| {
            let mut t = start_ns;
            while t <= start_ns + 1_000_000_000 {
                let vector = if t == impulse_ns {
                    [magnitude, 0.0, 0.0]
                } else {
                    [0.01, 0.0, 0.0]
                };
                accel_handle.deliver(SensorEvent::Sample(Sample::new(t, vector)));
                t += 4_000_000;
            }
            let mut t = start_ns;
            while t <= start_ns + 1_000_000_000 {
                orientation_handle.deliver(SensorEvent::Sample(Sample::new(t, [0.9, 0.05, -0.3])));
                t += 10_000_000;
            }
        };

        let mut engine = engine();
        let accel_buffer = manager.buffer("accel").unwrap();
        let orientation_buffer = manager.buffer("orientation").unwrap();

        deliver_window(4_000_000, 500_000_000, 80.0);
        let first = engine.poll(
            &snapshot_of(&accel_buffer),
            &snapshot_of(&orientation_buffer),
        );
        assert!(first.event.is_some());

        // Second impulse ~1.5 s later, inside the 5 s cooldown
        deliver_window(1_100_000_000, 2_000_000_000, 95.0);
        let second = engine.poll(
            &snapshot_of(&accel_buffer),
            &snapshot_of(&orientation_buffer),
        );
        assert!(second.event.is_none());
        assert_eq!(engine.events_confirmed(), 1);

        manager.disable_all();
    }

    /// Rate estimate converges for a constant-rate producer (timestamps in
    /// the producer's own clock domain).
    #[tokio::test]
    async fn test_rate_convergence() {
        let (manager, accel_handle, _orientation_handle) = push_pipeline();

        let rate = 250.0;
        let interval_ns = (1e9 / rate) as i64;
        for i in 1..=(rate as i64 * 5) {
            accel_handle.deliver(SensorEvent::Sample(Sample::new(
                i * interval_ns,
                [0.0, 0.0, 9.81],
            )));
        }

        let snapshot = snapshot_of(&manager.buffer("accel").unwrap());
        assert!(
            (snapshot.rate_hz - rate).abs() / rate < 0.05,
            "expected ~{rate} Hz, got {}",
            snapshot.rate_hz
        );

        manager.disable_all();
    }

    /// Simulated sources flow through the same manager contract as push
    /// sources.
    #[tokio::test]
    async fn test_simulated_source_smoke() {
        let mut manager = SensorManager::new();
        manager.register(Box::new(SimulatedSource::accelerometer(
            "sim_accel",
            200.0,
            64,
            15.0,
        )));
        manager.register(Box::new(SimulatedSource::orientation(
            "sim_orientation",
            100.0,
            32,
        )));
        manager.enable_all();

        tokio::time::sleep(Duration::from_millis(120)).await;

        let accel = snapshot_of(&manager.buffer("sim_accel").unwrap());
        assert!(accel.is_warm());
        assert_eq!(accel.len(), 64);
        assert_eq!(accel.accuracy, 3);

        let orientation = snapshot_of(&manager.buffer("sim_orientation").unwrap());
        assert!(orientation.is_warm());

        manager.disable_all();
        assert!(!manager.is_enabled("sim_accel"));
        // Idempotent: disabling an already-disabled pipeline never panics
        manager.disable_all();
    }

    /// Queue metrics reflect delivered event points and context batches.
    #[tokio::test]
    async fn test_telemetry_queue_integration() {
        let queue = TelemetryQueue::spawn(LogSink::new("e2e_log"));

        let event_point = TelemetryPoint::new("shot", 1_000_000_000)
            .tag("device", "unit-1")
            .field("peak_magnitude", 80.0);
        let context: Vec<TelemetryPoint> = (0..10)
            .map(|i| TelemetryPoint::new("shot_context", i).field("x", i as f64))
            .collect();

        assert!(queue.submit(TelemetryItem::Point(event_point)));
        assert!(queue.submit(TelemetryItem::Batch(context)));

        queue.shutdown().await;
        // point + batch drained before shutdown returned
    }

    /// Disable before enable, and double disable, leave the source usable.
    #[tokio::test]
    async fn test_idempotent_disable() {
        let source = SimulatedSource::accelerometer("sim", 100.0, 16, 5.0);
        source.disable();
        source.disable();
        assert!(!source.is_enabled());

        let seen = Arc::new(std::sync::Mutex::new(0u32));
        let sink = Arc::clone(&seen);
        source.enable(Arc::new(move |_| {
            *sink.lock().unwrap() += 1;
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        source.disable();
        source.disable();

        assert!(*seen.lock().unwrap() > 0);
    }
}
