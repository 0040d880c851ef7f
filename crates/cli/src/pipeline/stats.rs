//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::DetectionMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total poll ticks executed
    pub polls: u64,

    /// Total confirmed events
    pub events_confirmed: u64,

    /// Candidates rejected by the stability gate or cold streams
    pub candidates_rejected: u64,

    /// Orientation samples produced by the fusion path
    pub fused_samples: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of sensor streams that were active
    pub active_streams: usize,

    /// Number of telemetry sinks that received data
    pub active_sinks: usize,

    /// Detection metrics aggregator
    pub detection_metrics: DetectionMetricsAggregator,
}

impl PipelineStats {
    /// Confirmed events per minute of runtime
    pub fn events_per_minute(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_confirmed as f64 * 60.0 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Fraction of candidates that survived the stability gate
    #[allow(dead_code)]
    pub fn confirmation_rate(&self) -> f64 {
        let total = self.events_confirmed + self.candidates_rejected;
        if total > 0 {
            (self.events_confirmed as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   Poll ticks: {}", self.polls);
        println!("   Confirmed events: {}", self.events_confirmed);
        println!("   Rejected candidates: {}", self.candidates_rejected);
        println!("   Fused orientation samples: {}", self.fused_samples);
        println!("   Events/minute: {:.2}", self.events_per_minute());
        println!("   Active streams: {}", self.active_streams);
        println!("   Active sinks: {}", self.active_sinks);

        println!();
        print!("{}", self.detection_metrics.summary());
        println!();
    }
}
