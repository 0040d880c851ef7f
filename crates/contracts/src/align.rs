//! Stream alignment result types.

use serde::{Deserialize, Serialize};

/// Confidence of a timestamp alignment between two streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignConfidence {
    /// Lower-bound hit inside the target window
    Exact,

    /// Reference timestamp newer than every retained target sample; index
    /// clamped to the most recent sample
    ReferenceAhead,

    /// Target window no longer covers the reference (oldest retained target
    /// sample is already newer); synchronization failure, index clamped to
    /// the most recent sample
    WindowExpired,
}

impl AlignConfidence {
    /// True when the alignment should be surfaced as degraded/low-confidence.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, AlignConfidence::Exact)
    }

    /// Label used in logs and metric tags.
    pub fn label(&self) -> &'static str {
        match self {
            AlignConfidence::Exact => "exact",
            AlignConfidence::ReferenceAhead => "reference_ahead",
            AlignConfidence::WindowExpired => "window_expired",
        }
    }
}

/// Result of aligning a reference timestamp against a target stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    /// Resolved index into the target stream, after the backward offset
    pub index: usize,

    /// How trustworthy the resolved index is
    pub confidence: AlignConfidence,
}
