//! Small statistics helpers for the stability gate and gravity estimate.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two samples.
pub fn std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let variance = samples.iter().map(|v| (v - m).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}

/// Number of samples covering `window_ms` at `rate_hz`, clamped to
/// `2..=max_len`.
pub fn window_len(rate_hz: f64, window_ms: u64, max_len: usize) -> usize {
    if rate_hz <= 0.0 || max_len < 2 {
        return max_len.max(1);
    }
    let samples = (rate_hz * window_ms as f64 / 1000.0).round() as usize;
    samples.clamp(2, max_len)
}

/// Estimate a sample rate from the spacing of the most recent timestamps.
///
/// Fallback for snapshots taken before the rolling estimator's first
/// one-second refresh. Returns `None` when the spacing is degenerate.
pub fn estimate_rate_hz(timestamps: &[i64]) -> Option<f64> {
    const TAIL: usize = 16;
    let len = timestamps.len();
    if len < 2 {
        return None;
    }

    let tail = &timestamps[len.saturating_sub(TAIL)..];
    let span_ns = tail[tail.len() - 1] - tail[0];
    if span_ns <= 0 {
        return None;
    }

    Some((tail.len() - 1) as f64 / (span_ns as f64 / 1e9))
}
