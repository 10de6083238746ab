//! Per-source price state
//!
//! Answers "what was source S's price as of time T" with last-known-value
//! semantics: the most recent observation at or before T, no interpolation.
//!
//! Each source keeps a short tick deque rather than a single last pair:
//! the observation that advances the watermark past a boundary is often the
//! same one that would overwrite the price belonging to that boundary, so
//! the table must retain enough history to serve every not-yet-finalized
//! read point. The aggregator prunes after each finalization, which bounds
//! the deques by the timestamp skew between the fastest and slowest source.

use common::{SourceId, Tick};
use std::collections::VecDeque;

/// Array-backed per-source tick history.
#[derive(Debug)]
pub struct PriceTable {
    slots: Vec<VecDeque<Tick>>,
}

impl PriceTable {
    pub fn new(sources: usize) -> Self {
        Self {
            slots: (0..sources).map(|_| VecDeque::new()).collect(),
        }
    }

    pub fn sources(&self) -> usize {
        self.slots.len()
    }

    /// Append one tick. The caller has already enforced strictly increasing
    /// timestamps per source.
    pub fn record(&mut self, source: SourceId, tick: Tick) {
        let slot = &mut self.slots[source.index()];
        debug_assert!(slot.back().map_or(true, |b| b.timestamp < tick.timestamp));
        slot.push_back(tick);
    }

    /// The source's price at the most recent timestamp <= `t`, or None if
    /// the source has never reported data at or before `t`.
    pub fn price_as_of(&self, source: SourceId, t: i64) -> Option<f64> {
        self.slots[source.index()]
            .iter()
            .rev()
            .find(|tick| tick.timestamp <= t)
            .map(|tick| tick.price)
    }

    /// Drop ticks shadowed by a later tick still at or before `cutoff`.
    ///
    /// After this, every query at `t >= cutoff` returns the same answer as
    /// before; queries older than `cutoff` are no longer supported.
    pub fn prune_through(&mut self, cutoff: i64) {
        for slot in &mut self.slots {
            while slot.len() >= 2 && slot[1].timestamp <= cutoff {
                slot.pop_front();
            }
        }
    }

    #[cfg(test)]
    fn depth(&self, source: SourceId) -> usize {
        self.slots[source.index()].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_before_first_tick() {
        let mut table = PriceTable::new(1);
        assert_eq!(table.price_as_of(SourceId(0), 100), None);

        table.record(SourceId(0), Tick::new(50, 99.5));
        assert_eq!(table.price_as_of(SourceId(0), 49), None);
        assert_eq!(table.price_as_of(SourceId(0), 50), Some(99.5));
    }

    #[test]
    fn test_last_known_value_semantics() {
        let mut table = PriceTable::new(1);
        table.record(SourceId(0), Tick::new(0, 100.0));
        table.record(SourceId(0), Tick::new(65, 102.0));
        table.record(SourceId(0), Tick::new(130, 104.0));

        assert_eq!(table.price_as_of(SourceId(0), 59), Some(100.0));
        assert_eq!(table.price_as_of(SourceId(0), 119), Some(102.0));
        assert_eq!(table.price_as_of(SourceId(0), 1000), Some(104.0));
    }

    #[test]
    fn test_prune_preserves_future_reads() {
        let mut table = PriceTable::new(1);
        table.record(SourceId(0), Tick::new(0, 100.0));
        table.record(SourceId(0), Tick::new(30, 101.0));
        table.record(SourceId(0), Tick::new(65, 102.0));

        table.prune_through(60);

        // The tick at 30 is the last-known value for reads at t >= 60
        assert_eq!(table.price_as_of(SourceId(0), 60), Some(101.0));
        assert_eq!(table.price_as_of(SourceId(0), 119), Some(102.0));
        // The tick at 0 was shadowed and dropped
        assert_eq!(table.depth(SourceId(0)), 2);
    }

    #[test]
    fn test_prune_never_empties_a_slot() {
        let mut table = PriceTable::new(1);
        table.record(SourceId(0), Tick::new(10, 100.0));

        table.prune_through(10_000);
        assert_eq!(table.price_as_of(SourceId(0), 10_000), Some(100.0));
    }

    #[test]
    fn test_sources_are_independent() {
        let mut table = PriceTable::new(2);
        table.record(SourceId(0), Tick::new(0, 100.0));
        table.record(SourceId(1), Tick::new(0, 200.0));

        assert_eq!(table.price_as_of(SourceId(0), 10), Some(100.0));
        assert_eq!(table.price_as_of(SourceId(1), 10), Some(200.0));
    }
}
