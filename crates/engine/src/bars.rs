//! Bar finalization
//!
//! A boundary M covers [M, M+width). It may finalize while sources are live
//! once the watermark clears `M + safety_margin` (margin defaults to the bar
//! width, so every observation belonging to the bar has provably arrived),
//! and unconditionally during drain for every boundary at or below the last
//! observed timestamp. Each source contributes its last price before the
//! bar close; a boundary where no source has any price yet produces a gap,
//! not a zero bar.

use crate::combine::Combiner;
use crate::prices::PriceTable;
use crate::watermark::Progress;
use common::{Bar, SourceId};
use tracing::debug;

/// Finalizes boundaries as the watermark lets them go.
#[derive(Debug)]
pub struct BarAggregator {
    width: i64,
    margin: i64,
    combiner: Combiner,
    /// Earliest boundary not yet finalized; None until the first observation
    next_boundary: Option<i64>,
}

impl BarAggregator {
    pub fn new(width: i64, margin: i64, combiner: Combiner) -> Self {
        Self {
            width,
            margin,
            combiner,
            next_boundary: None,
        }
    }

    /// Anchor the first boundary at the first observation's minute.
    pub fn note_first_observation(&mut self, timestamp: i64) {
        if self.next_boundary.is_none() {
            let boundary = self.truncate(timestamp);
            debug!(boundary, "First boundary anchored");
            self.next_boundary = Some(boundary);
        }
    }

    fn truncate(&self, timestamp: i64) -> i64 {
        timestamp - timestamp.rem_euclid(self.width)
    }

    /// Finalize every boundary the given progress allows, oldest first.
    ///
    /// Returns the bars to emit; boundaries whose combine set is empty are
    /// skipped (gap) but still advance. Served history is pruned.
    pub fn poll(&mut self, progress: Progress, table: &mut PriceTable) -> Vec<Bar> {
        let Some(mut boundary) = self.next_boundary else {
            return Vec::new();
        };

        let mut bars = Vec::new();
        loop {
            let eligible = match progress {
                Progress::Pending | Progress::Drained(None) => false,
                Progress::Live(w) => w >= boundary + self.margin,
                Progress::Drained(Some(max)) => boundary <= max,
            };
            if !eligible {
                break;
            }

            if let Some(bar) = self.build(boundary, table) {
                bars.push(bar);
            } else {
                debug!(boundary, "No prices known at boundary, emitting gap");
            }
            boundary += self.width;
        }

        if Some(boundary) != self.next_boundary {
            self.next_boundary = Some(boundary);
            table.prune_through(boundary);
        }
        bars
    }

    fn build(&self, boundary: i64, table: &PriceTable) -> Option<Bar> {
        // Last observation strictly before the bar close; timestamps are
        // whole seconds, so close - 1 is the inclusive read point.
        let read_point = boundary + self.width - 1;

        let prices: Vec<f64> = (0..table.sources())
            .filter_map(|index| table.price_as_of(SourceId(index as u16), read_point))
            .collect();

        self.combiner
            .apply(&prices)
            .map(|price| Bar::new(boundary, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Tick;

    fn table_with(ticks: &[(u16, i64, f64)], sources: usize) -> PriceTable {
        let mut table = PriceTable::new(sources);
        for &(source, ts, price) in ticks {
            table.record(SourceId(source), Tick::new(ts, price));
        }
        table
    }

    #[test]
    fn test_no_bars_before_first_observation() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        let mut table = PriceTable::new(1);
        assert!(agg.poll(Progress::Live(1000), &mut table).is_empty());
    }

    #[test]
    fn test_boundary_anchored_by_truncation() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        agg.note_first_observation(95);
        let mut table = table_with(&[(0, 95, 100.0)], 1);

        let bars = agg.poll(Progress::Live(180), &mut table);
        assert_eq!(bars, vec![Bar::new(60, 100.0)]);
    }

    #[test]
    fn test_margin_holds_back_finalization() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        agg.note_first_observation(0);
        let mut table = table_with(&[(0, 0, 100.0)], 1);

        // Watermark has reached the boundary but not cleared the margin
        assert!(agg.poll(Progress::Live(59), &mut table).is_empty());

        let bars = agg.poll(Progress::Live(60), &mut table);
        assert_eq!(bars, vec![Bar::new(0, 100.0)]);
    }

    #[test]
    fn test_bar_uses_last_price_before_close() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        agg.note_first_observation(0);
        let mut table = table_with(&[(0, 0, 100.0), (0, 65, 102.0), (0, 130, 104.0)], 1);

        let bars = agg.poll(Progress::Live(130), &mut table);
        assert_eq!(bars, vec![Bar::new(0, 100.0), Bar::new(60, 102.0)]);
    }

    #[test]
    fn test_multiple_boundaries_finalize_in_order() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        agg.note_first_observation(0);
        let mut table = table_with(&[(0, 0, 100.0), (0, 200, 106.0)], 1);

        let bars = agg.poll(Progress::Live(230), &mut table);
        let starts: Vec<i64> = bars.iter().map(|b| b.minute_start).collect();
        assert_eq!(starts, vec![0, 60, 120]);
        // Gap-free here: last-known value carries forward
        assert_eq!(bars[1].index_price, 100.0);
    }

    #[test]
    fn test_drain_flushes_through_max_and_ignores_margin() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        agg.note_first_observation(0);
        let mut table = table_with(&[(0, 0, 100.0), (0, 65, 102.0), (0, 130, 104.0)], 1);

        let live = agg.poll(Progress::Live(130), &mut table);
        assert_eq!(live.len(), 2);

        let drained = agg.poll(Progress::Drained(Some(130)), &mut table);
        assert_eq!(drained, vec![Bar::new(120, 104.0)]);

        // Nothing beyond the drain point
        assert!(agg.poll(Progress::Drained(Some(130)), &mut table).is_empty());
    }

    #[test]
    fn test_drain_with_no_data_emits_nothing() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        let mut table = PriceTable::new(1);
        assert!(agg.poll(Progress::Drained(None), &mut table).is_empty());
    }

    #[test]
    fn test_two_source_median() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        agg.note_first_observation(0);
        let mut table = table_with(&[(0, 0, 100.0), (1, 0, 200.0), (0, 61, 110.0)], 2);

        let bars = agg.poll(Progress::Live(61), &mut table);
        assert_eq!(bars, vec![Bar::new(0, 150.0)]);

        let drained = agg.poll(Progress::Drained(Some(61)), &mut table);
        assert_eq!(drained, vec![Bar::new(60, 155.0)]);
    }

    #[test]
    fn test_source_without_data_is_excluded_from_combine() {
        let mut agg = BarAggregator::new(60, 60, Combiner::Median);
        agg.note_first_observation(0);
        // Source 1 never reported; bar is source 0 alone
        let mut table = table_with(&[(0, 0, 100.0)], 2);

        let bars = agg.poll(Progress::Live(60), &mut table);
        assert_eq!(bars, vec![Bar::new(0, 100.0)]);
    }

    #[test]
    fn test_custom_bar_width() {
        let mut agg = BarAggregator::new(10, 10, Combiner::Mean);
        agg.note_first_observation(7);
        let mut table = table_with(&[(0, 7, 100.0), (0, 12, 104.0)], 1);

        let bars = agg.poll(Progress::Live(20), &mut table);
        assert_eq!(bars, vec![Bar::new(0, 100.0)]);
    }
}
