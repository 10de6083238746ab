//! Watermark tracking
//!
//! The watermark is the timestamp below which no live source can still
//! produce an unseen observation. Each source's ticks are strictly
//! increasing, so the minimum last-observed timestamp over Active sources
//! is that bound. Sources that closed or errored can never again constrain
//! how far it is safe to finalize, so they drop out of the minimum instead
//! of stalling the remaining feeds forever.
//!
//! The minimum is maintained with a lazy min-heap: every accepted
//! observation pushes a generation-stamped entry, and stale entries are
//! discarded when the top is read. With at most one live entry per source
//! the heap stays small and updates are O(log n).

use common::{SourceId, SourceStatus};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Global progress derived from per-source freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// At least one live source has never reported; nothing may finalize,
    /// because an unreported source can still deliver arbitrarily old data.
    Pending,

    /// All live sources have reported; no live source can still deliver an
    /// observation with a timestamp at or below this value.
    Live(i64),

    /// No live sources remain. Carries the maximum timestamp ever observed
    /// (None when no source delivered any data at all), up to which the
    /// aggregator flushes before the engine stops.
    Drained(Option<i64>),
}

impl Progress {
    /// The finalization bound, if one exists yet.
    pub fn bound(&self) -> Option<i64> {
        match self {
            Progress::Pending => None,
            Progress::Live(w) => Some(*w),
            Progress::Drained(max) => *max,
        }
    }
}

/// Why an observation was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Timestamp at or below the source's previous one - protocol violation
    OutOfOrder { last: i64 },
    /// The source already terminated
    NotActive,
}

#[derive(Debug)]
struct Slot {
    status: SourceStatus,
    last_ts: Option<i64>,
    generation: u64,
}

/// Tracks per-source freshness and derives the global watermark.
#[derive(Debug)]
pub struct WatermarkTracker {
    slots: Vec<Slot>,
    /// Min-heap of (last_ts, generation, slot); entries go stale on update
    heap: BinaryHeap<Reverse<(i64, u64, usize)>>,
    active: usize,
    /// Active sources that have reported at least one tick
    reported: usize,
    max_seen: Option<i64>,
}

impl WatermarkTracker {
    pub fn new(sources: usize) -> Self {
        let slots = (0..sources)
            .map(|_| Slot {
                status: SourceStatus::Active,
                last_ts: None,
                generation: 0,
            })
            .collect();
        Self {
            slots,
            heap: BinaryHeap::new(),
            active: sources,
            reported: 0,
            max_seen: None,
        }
    }

    /// Record one observation timestamp for a source.
    ///
    /// Rejected observations leave the source's state and the watermark
    /// untouched.
    pub fn observe(&mut self, source: SourceId, timestamp: i64) -> Result<(), Rejection> {
        let slot = &mut self.slots[source.index()];

        if !slot.status.is_live() {
            return Err(Rejection::NotActive);
        }
        if let Some(last) = slot.last_ts {
            if timestamp <= last {
                return Err(Rejection::OutOfOrder { last });
            }
        } else {
            self.reported += 1;
        }

        slot.last_ts = Some(timestamp);
        slot.generation += 1;
        self.heap
            .push(Reverse((timestamp, slot.generation, source.index())));

        self.max_seen = Some(self.max_seen.map_or(timestamp, |m| m.max(timestamp)));
        Ok(())
    }

    /// Transition a source out of the Active set.
    ///
    /// Idempotent: closing an already-terminated source is a no-op.
    pub fn close(&mut self, source: SourceId, errored: bool) {
        let slot = &mut self.slots[source.index()];
        if !slot.status.is_live() {
            return;
        }

        slot.status = if errored {
            SourceStatus::Errored
        } else {
            SourceStatus::Closed
        };
        self.active -= 1;
        if slot.last_ts.is_some() {
            self.reported -= 1;
        }
    }

    /// Current global progress. Non-decreasing across calls.
    pub fn progress(&mut self) -> Progress {
        if self.active == 0 {
            return Progress::Drained(self.max_seen);
        }
        if self.reported < self.active {
            return Progress::Pending;
        }

        // Drop stale heap entries: superseded generations and entries for
        // sources that are no longer live.
        while let Some(Reverse((ts, generation, index))) = self.heap.peek().copied() {
            let slot = &self.slots[index];
            let current = slot.status.is_live()
                && slot.generation == generation
                && slot.last_ts == Some(ts);
            if current {
                return Progress::Live(ts);
            }
            self.heap.pop();
        }

        // Unreachable while reported == active >= 1: every reported live
        // source has a current heap entry.
        Progress::Pending
    }

    pub fn status(&self, source: SourceId) -> SourceStatus {
        self.slots[source.index()].status
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn last_timestamp(&self, source: SourceId) -> Option<i64> {
        self.slots[source.index()].last_ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_pending_until_every_live_source_reports() {
        let mut tracker = WatermarkTracker::new(2);
        assert_eq!(tracker.progress(), Progress::Pending);

        tracker.observe(SourceId(0), 100).unwrap();
        assert_eq!(tracker.progress(), Progress::Pending);

        tracker.observe(SourceId(1), 40).unwrap();
        assert_eq!(tracker.progress(), Progress::Live(40));
    }

    #[test]
    fn test_watermark_is_min_over_active_sources() {
        let mut tracker = WatermarkTracker::new(3);
        tracker.observe(SourceId(0), 10).unwrap();
        tracker.observe(SourceId(1), 20).unwrap();
        tracker.observe(SourceId(2), 30).unwrap();
        assert_eq!(tracker.progress(), Progress::Live(10));

        tracker.observe(SourceId(0), 25).unwrap();
        assert_eq!(tracker.progress(), Progress::Live(20));
    }

    #[test]
    fn test_watermark_never_decreases() {
        let mut tracker = WatermarkTracker::new(3);
        let script: &[(u16, i64)] = &[
            (0, 5),
            (1, 3),
            (2, 8),
            (0, 9),
            (1, 4),
            (2, 100),
            (1, 50),
            (0, 60),
        ];

        let mut previous = i64::MIN;
        for &(source, ts) in script {
            tracker.observe(SourceId(source), ts).unwrap();
            if let Progress::Live(w) = tracker.progress() {
                assert!(w >= previous, "watermark went backwards: {} < {}", w, previous);
                previous = w;
            }
        }
    }

    #[test]
    fn test_out_of_order_leaves_state_untouched() {
        let mut tracker = WatermarkTracker::new(1);
        tracker.observe(SourceId(0), 10).unwrap();

        assert_eq!(
            tracker.observe(SourceId(0), 5),
            Err(Rejection::OutOfOrder { last: 10 })
        );
        // Equal timestamps are violations too
        assert_eq!(
            tracker.observe(SourceId(0), 10),
            Err(Rejection::OutOfOrder { last: 10 })
        );

        assert_eq!(tracker.last_timestamp(SourceId(0)), Some(10));
        assert_eq!(tracker.progress(), Progress::Live(10));
    }

    #[test]
    fn test_closed_source_stops_constraining() {
        let mut tracker = WatermarkTracker::new(2);
        tracker.observe(SourceId(0), 5).unwrap();
        tracker.observe(SourceId(1), 100).unwrap();
        assert_eq!(tracker.progress(), Progress::Live(5));

        tracker.close(SourceId(0), false);
        assert_eq!(tracker.progress(), Progress::Live(100));
        assert_eq!(tracker.status(SourceId(0)), SourceStatus::Closed);
    }

    #[test]
    fn test_unreported_source_closing_unblocks_pending() {
        let mut tracker = WatermarkTracker::new(2);
        tracker.observe(SourceId(0), 42).unwrap();
        assert_eq!(tracker.progress(), Progress::Pending);

        tracker.close(SourceId(1), true);
        assert_eq!(tracker.progress(), Progress::Live(42));
        assert_eq!(tracker.status(SourceId(1)), SourceStatus::Errored);
    }

    #[test]
    fn test_drain_carries_max_seen() {
        let mut tracker = WatermarkTracker::new(2);
        tracker.observe(SourceId(0), 130).unwrap();
        tracker.observe(SourceId(1), 61).unwrap();

        tracker.close(SourceId(0), false);
        assert_eq!(tracker.progress(), Progress::Live(61));

        tracker.close(SourceId(1), false);
        assert_eq!(tracker.progress(), Progress::Drained(Some(130)));
    }

    #[test]
    fn test_drain_with_no_data_at_all() {
        let mut tracker = WatermarkTracker::new(2);
        tracker.close(SourceId(0), true);
        tracker.close(SourceId(1), false);
        assert_eq!(tracker.progress(), Progress::Drained(None));
    }

    #[test]
    fn test_observe_after_close_is_rejected() {
        let mut tracker = WatermarkTracker::new(1);
        tracker.observe(SourceId(0), 10).unwrap();
        tracker.close(SourceId(0), false);

        assert_matches!(
            tracker.observe(SourceId(0), 20),
            Err(Rejection::NotActive)
        );
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut tracker = WatermarkTracker::new(2);
        tracker.observe(SourceId(0), 10).unwrap();
        tracker.observe(SourceId(1), 20).unwrap();

        tracker.close(SourceId(0), false);
        tracker.close(SourceId(0), true);
        assert_eq!(tracker.status(SourceId(0)), SourceStatus::Closed);
        assert_eq!(tracker.active_count(), 1);
    }
}
