//! Timestamp alignment between independently clocked streams.

use contracts::{AlignConfidence, AlignConfig, Alignment};
use tracing::warn;

/// Locate the index in `target_timestamps` best matching `reference_ns`.
///
/// `target_timestamps` is sorted non-decreasing best-effort; rare inversions
/// from producer races are tolerated (the result degrades to approximate,
/// never panics). The search is a lower bound: first index whose timestamp
/// is `>= reference_ns`.
///
/// Edge cases, part of the observable contract:
/// - reference newer than every target sample → clamp to `len - 1`, flag
///   [`AlignConfidence::ReferenceAhead`]
/// - lower bound lands at index 0 → the target's oldest retained sample is
///   already newer than the reference, i.e. the window no longer covers it;
///   clamp to `len - 1`, flag [`AlignConfidence::WindowExpired`]
/// - exact-window hits back off by `config.backoff_samples` to exclude
///   samples contaminated by post-impulse ringing, saturating at 0
pub fn align(reference_ns: i64, target_timestamps: &[i64], config: &AlignConfig) -> Alignment {
    let len = target_timestamps.len();
    if len == 0 {
        return Alignment {
            index: 0,
            confidence: AlignConfidence::WindowExpired,
        };
    }

    let lower = target_timestamps.partition_point(|&t| t < reference_ns);

    let (index, confidence) = if lower == len {
        (len - 1, AlignConfidence::ReferenceAhead)
    } else if lower == 0 {
        (len - 1, AlignConfidence::WindowExpired)
    } else {
        (lower.saturating_sub(config.backoff_samples), AlignConfidence::Exact)
    };

    if confidence.is_degraded() {
        warn!(
            reference_ns,
            window_start = target_timestamps[0],
            window_end = target_timestamps[len - 1],
            resolved_index = index,
            confidence = confidence.label(),
            "stream alignment degraded"
        );
        metrics::counter!(
            "bowsense_alignment_degraded_total",
            "confidence" => confidence.label()
        )
        .increment(1);
    }

    Alignment { index, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(n: usize, step_ns: i64) -> Vec<i64> {
        (1..=n as i64).map(|i| i * step_ns).collect()
    }

    fn config(backoff: usize) -> AlignConfig {
        AlignConfig {
            backoff_samples: backoff,
        }
    }

    #[test]
    fn exact_hit_backs_off_by_configured_samples() {
        let targets = timestamps(100, 10_000_000);
        // reference equals targets[40]
        let result = align(targets[40], &targets, &config(3));
        assert_eq!(result.confidence, AlignConfidence::Exact);
        assert_eq!(result.index, 40 - 3);
    }

    #[test]
    fn backoff_clamps_at_zero() {
        let targets = timestamps(10, 1_000);
        let result = align(targets[1], &targets, &config(5));
        assert_eq!(result.confidence, AlignConfidence::Exact);
        assert_eq!(result.index, 0);
    }

    #[test]
    fn reference_between_samples_takes_lower_bound() {
        let targets = timestamps(10, 1_000);
        // between targets[4]=5000 and targets[5]=6000
        let result = align(5_500, &targets, &config(0));
        assert_eq!(result.confidence, AlignConfidence::Exact);
        assert_eq!(result.index, 5);
    }

    #[test]
    fn future_reference_clamps_to_most_recent_and_flags() {
        let targets = timestamps(50, 10_000_000);
        let result = align(targets[49] + 1, &targets, &config(3));
        assert_eq!(result.index, 49);
        assert_eq!(result.confidence, AlignConfidence::ReferenceAhead);
        assert!(result.confidence.is_degraded());
    }

    #[test]
    fn stale_reference_is_window_expired() {
        let targets = timestamps(50, 10_000_000);
        // older than the oldest retained sample
        let result = align(5_000, &targets, &config(3));
        assert_eq!(result.index, 49);
        assert_eq!(result.confidence, AlignConfidence::WindowExpired);
    }

    #[test]
    fn empty_targets_do_not_panic() {
        let result = align(1_000, &[], &config(3));
        assert_eq!(result.index, 0);
        assert_eq!(result.confidence, AlignConfidence::WindowExpired);
    }

    #[test]
    fn tolerates_rare_inversion() {
        // One out-of-order entry; result stays in bounds
        let targets = vec![1_000, 2_000, 4_000, 3_000, 5_000];
        let result = align(3_500, &targets, &config(0));
        assert!(result.index < targets.len());
    }
}
