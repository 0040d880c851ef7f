//! Notification boundary implementation.
//!
//! On a handheld build this is where platform notifications would hang off;
//! the CLI renders both channels through tracing. Fire-and-forget: nothing
//! here can block or fail the detection path.

use contracts::{Notifier, StatusReport};
use tracing::info;

/// Notifier that renders notifications and status lines via tracing.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create a new LogNotifier.
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title = %title, message = %message, "notification");
    }

    fn status(&self, report: &StatusReport) {
        let rates = report
            .stream_rates
            .iter()
            .map(|(id, rate)| format!("{id}={rate:.1}Hz"))
            .collect::<Vec<_>>()
            .join(" ");

        info!(
            rates = %rates,
            accuracy = report.accuracy,
            event_count = report.event_count,
            "status"
        );
    }
}
