//! Detection metric collection.
//!
//! Records facade metrics from poll outcomes and aggregates them in memory
//! for the end-of-run summary.

use contracts::{Alignment, EventRecord};
use metrics::{counter, gauge, histogram};

/// Record metrics for a confirmed event.
///
/// Call once per `EventRecord` produced by the detection engine.
pub fn record_event_metrics(event: &EventRecord, alignment: Option<&Alignment>) {
    counter!("bowsense_events_confirmed_total").increment(1);
    gauge!("bowsense_last_event_time_ns").set(event.event_time_ns as f64);

    histogram!("bowsense_event_peak_magnitude").record(event.peak_magnitude);
    counter!(
        "bowsense_event_peak_axis_total",
        "axis" => event.peak_axis.to_string()
    )
    .increment(1);

    for (axis, std) in event.std_per_axis.iter().enumerate() {
        histogram!(
            "bowsense_event_stability_std",
            "axis" => axis.to_string()
        )
        .record(*std);
    }

    if let Some(alignment) = alignment {
        if alignment.confidence.is_degraded() {
            counter!(
                "bowsense_event_alignment_degraded_total",
                "confidence" => alignment.confidence.label()
            )
            .increment(1);
        }
    }

    if event.orientation_at_event.is_none() {
        counter!("bowsense_events_without_orientation_total").increment(1);
    }
}

/// Record per-tick poll metrics.
pub fn record_poll_metrics(polls: u64, candidates_rejected: u64) {
    gauge!("bowsense_polls_total").set(polls as f64);
    gauge!("bowsense_candidates_rejected_current").set(candidates_rejected as f64);
}

/// Record a stream's current rate estimate.
pub fn record_stream_rate(stream_id: &str, rate_hz: f64) {
    gauge!(
        "bowsense_stream_rate_hz",
        "stream_id" => stream_id.to_string()
    )
    .set(rate_hz);
}

/// Record a telemetry write outcome.
pub fn record_telemetry_write(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "bowsense_telemetry_writes_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Detection metrics aggregator.
///
/// Aggregates in memory for statistics and end-of-run summaries.
#[derive(Debug, Clone, Default)]
pub struct DetectionMetricsAggregator {
    /// Confirmed events
    pub total_events: u64,

    /// Candidates rejected by the stability gate
    pub total_rejected: u64,

    /// Events whose alignment was degraded
    pub degraded_alignments: u64,

    /// Events confirmed without orientation context
    pub events_without_orientation: u64,

    /// Peak magnitude statistics
    pub peak_stats: RunningStats,

    /// Stability-std statistics across all axes
    pub std_stats: RunningStats,
}

impl DetectionMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one confirmed event into the aggregate
    pub fn update_event(&mut self, event: &EventRecord, alignment: Option<&Alignment>) {
        self.total_events += 1;
        self.peak_stats.push(event.peak_magnitude);
        for std in &event.std_per_axis {
            self.std_stats.push(*std);
        }

        if alignment.map(|a| a.confidence.is_degraded()).unwrap_or(false) {
            self.degraded_alignments += 1;
        }
        if event.orientation_at_event.is_none() {
            self.events_without_orientation += 1;
        }
    }

    /// Record rejected candidates
    pub fn update_rejected(&mut self, total_rejected: u64) {
        self.total_rejected = total_rejected;
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_events: self.total_events,
            total_rejected: self.total_rejected,
            degraded_alignments: self.degraded_alignments,
            events_without_orientation: self.events_without_orientation,
            peak_magnitude: StatsSummary::from(&self.peak_stats),
            stability_std: StatsSummary::from(&self.std_stats),
        }
    }

    /// Reset all aggregates
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_events: u64,
    pub total_rejected: u64,
    pub degraded_alignments: u64,
    pub events_without_orientation: u64,
    pub peak_magnitude: StatsSummary,
    pub stability_std: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Detection Summary ===")?;
        writeln!(f, "Confirmed events: {}", self.total_events)?;
        writeln!(f, "Rejected candidates: {}", self.total_rejected)?;
        writeln!(f, "Degraded alignments: {}", self.degraded_alignments)?;
        writeln!(
            f,
            "Events without orientation context: {}",
            self.events_without_orientation
        )?;
        writeln!(f, "Peak magnitude: {}", self.peak_magnitude)?;
        writeln!(f, "Stability std: {}", self.stability_std)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
