//! Progress snapshots derived from observed byte counts.

use std::time::SystemTime;

use serde::Serialize;

/// A point-in-time progress reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Bytes moved so far.
    pub bytes_transferred: u64,
    /// Declared total, when the transport knows it.
    pub total_bytes: Option<u64>,
    /// Completion percentage in `[0, 100]`; absent when the total is unknown.
    pub percent: Option<f64>,
    /// When the reading was taken.
    pub timestamp: SystemTime,
}

impl ProgressSnapshot {
    /// Builds a snapshot for the given counts, stamped with the current time.
    #[must_use]
    pub fn new(bytes_transferred: u64, total_bytes: Option<u64>) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
            percent: total_bytes.map(|total| percent_of(bytes_transferred, total)),
            timestamp: SystemTime::now(),
        }
    }
}

/// Percentage of `total` covered by `bytes`, clamped to `[0, 100]`.
///
/// A zero total counts as complete. Totals smaller than the observed bytes
/// (re-encoded responses) clamp to 100 instead of overshooting.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent_of(bytes: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (bytes as f64 * 100.0 / total as f64).clamp(0.0, 100.0)
}

/// Running byte counter for one session.
///
/// The total may be declared once, before any bytes are counted; the count
/// only moves forward.
#[derive(Debug, Default, Clone)]
pub struct ProgressTracker {
    transferred: u64,
    total: Option<u64>,
}

impl ProgressTracker {
    /// Creates a tracker with no bytes counted and no total.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the total size.
    ///
    /// Returns false (and changes nothing) if a total was already declared
    /// or bytes have already been counted.
    pub fn declare_total(&mut self, total: u64) -> bool {
        if self.total.is_some() || self.transferred > 0 {
            return false;
        }
        self.total = Some(total);
        true
    }

    /// Adds `bytes` to the running count.
    pub fn advance(&mut self, bytes: u64) {
        self.transferred = self.transferred.saturating_add(bytes);
    }

    /// Moves the count to a cumulative value; values behind the current count
    /// are ignored.
    pub fn advance_to(&mut self, cumulative: u64) {
        self.transferred = self.transferred.max(cumulative);
    }

    /// Bytes counted so far.
    #[must_use]
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    /// Declared total, if any.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Snapshot of the current counts.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(self.transferred, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_without_total_has_no_percent() {
        let snapshot = ProgressSnapshot::new(500, None);
        assert_eq!(snapshot.bytes_transferred, 500);
        assert_eq!(snapshot.total_bytes, None);
        assert_eq!(snapshot.percent, None);
    }

    #[test]
    fn test_percent_of_known_total() {
        assert_eq!(percent_of(400, 1000), 40.0);
        assert_eq!(percent_of(800, 1000), 80.0);
        assert_eq!(percent_of(1000, 1000), 100.0);
    }

    #[test]
    fn test_percent_clamps_when_total_understated() {
        assert_eq!(percent_of(1500, 1000), 100.0);
    }

    #[test]
    fn test_percent_of_zero_total_is_complete() {
        assert_eq!(percent_of(0, 0), 100.0);
    }

    #[test]
    fn test_tracker_declares_total_once() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.declare_total(1000));
        assert!(!tracker.declare_total(2000));
        assert_eq!(tracker.total(), Some(1000));
    }

    #[test]
    fn test_tracker_rejects_total_after_bytes_counted() {
        let mut tracker = ProgressTracker::new();
        tracker.advance(10);
        assert!(!tracker.declare_total(1000));
        assert_eq!(tracker.snapshot().percent, None);
    }

    #[test]
    fn test_tracker_advance_to_never_moves_backwards() {
        let mut tracker = ProgressTracker::new();
        tracker.advance_to(300);
        tracker.advance_to(200);
        assert_eq!(tracker.transferred(), 300);
    }

    #[test]
    fn test_tracker_snapshot_sequence() {
        let mut tracker = ProgressTracker::new();
        tracker.declare_total(1000);
        let percents: Vec<_> = [400, 400, 200]
            .into_iter()
            .map(|n| {
                tracker.advance(n);
                tracker.snapshot().percent
            })
            .collect();
        assert_eq!(percents, vec![Some(40.0), Some(80.0), Some(100.0)]);
    }
}
