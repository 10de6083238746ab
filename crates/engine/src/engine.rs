//! The merge engine
//!
//! One consumer task owns all mutable merge state (watermark tracker, price
//! table, aggregator) and drains a single bounded channel fed by the stream
//! adapters. Single-writer semantics: no locks anywhere inside the merge
//! logic, only the channel at the ingress boundary.

use crate::bars::BarAggregator;
use crate::combine::Combiner;
use crate::error::EngineError;
use crate::prices::PriceTable;
use crate::sink::BarSink;
use crate::watermark::{Progress, Rejection, WatermarkTracker};
use common::{FeedEvent, Observation, SourceId, MAX_SOURCES};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Width of one bar in seconds
    pub bar_width_secs: i64,
    /// Watermark clearance required beyond a boundary before it finalizes
    pub safety_margin_secs: i64,
    /// How per-source prices become one index value
    pub combine: Combiner,
    /// Capacity of the fan-in channel; adapters block when it is full
    pub queue_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            bar_width_secs: 60,
            safety_margin_secs: 60,
            combine: Combiner::Median,
            queue_capacity: 1024,
        }
    }
}

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// At least one source is still live
    Running,
    /// No live sources remain; flushing remaining eligible boundaries
    Draining,
    /// Everything eligible was emitted and the sink was notified
    Stopped,
}

/// What an engine run did, for the caller to log or assert on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSummary {
    pub bars_emitted: u64,
    pub observations: u64,
    pub observations_rejected: u64,
    pub source_errors: u64,
    /// The finalization bound when the engine stopped
    pub final_watermark: Option<i64>,
}

/// The stream-merge engine. Construct with [`IndexEngine::new`], hand the
/// returned sender to one adapter per source, then [`run`](Self::run) to
/// completion.
pub struct IndexEngine {
    settings: EngineSettings,
    names: Vec<String>,
    rx: mpsc::Receiver<FeedEvent>,
    tracker: WatermarkTracker,
    prices: PriceTable,
    aggregator: BarAggregator,
    state: EngineState,
    summary: EngineSummary,
}

impl IndexEngine {
    /// Build an engine for the named sources.
    ///
    /// `SourceId(i)` corresponds to `names[i]`; adapters must tag events
    /// accordingly. All senders cloned from the returned one must
    /// eventually deliver a terminal marker or be dropped.
    pub fn new(
        settings: EngineSettings,
        names: Vec<String>,
    ) -> Result<(Self, mpsc::Sender<FeedEvent>), EngineError> {
        if names.is_empty() {
            return Err(EngineError::NoSources);
        }
        if names.len() > MAX_SOURCES {
            return Err(EngineError::TooManySources(names.len()));
        }
        if settings.bar_width_secs <= 0 {
            return Err(EngineError::InvalidSettings(format!(
                "bar width must be positive, got {}",
                settings.bar_width_secs
            )));
        }
        if settings.safety_margin_secs < 0 {
            return Err(EngineError::InvalidSettings(format!(
                "safety margin must not be negative, got {}",
                settings.safety_margin_secs
            )));
        }
        if settings.queue_capacity == 0 {
            return Err(EngineError::InvalidSettings(
                "queue capacity must be positive".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(settings.queue_capacity);
        let sources = names.len();
        let engine = Self {
            tracker: WatermarkTracker::new(sources),
            prices: PriceTable::new(sources),
            aggregator: BarAggregator::new(
                settings.bar_width_secs,
                settings.safety_margin_secs,
                settings.combine,
            ),
            settings,
            names,
            rx,
            state: EngineState::Running,
            summary: EngineSummary::default(),
        };
        Ok((engine, tx))
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Consume events until every source terminated, emitting bars to the
    /// sink as they become final. Returns the run summary.
    pub async fn run<S: BarSink>(mut self, sink: &mut S) -> Result<EngineSummary, EngineError> {
        info!(
            sources = self.names.len(),
            bar_width = self.settings.bar_width_secs,
            margin = self.settings.safety_margin_secs,
            combine = %self.settings.combine,
            "Index engine running"
        );

        while let Some(event) = self.rx.recv().await {
            match event {
                FeedEvent::Observation(obs) => self.on_observation(obs),
                FeedEvent::Terminal {
                    source,
                    last_timestamp,
                    error,
                } => self.on_terminal(source, last_timestamp, error, sink).await?,
            }

            self.emit_eligible(sink).await?;

            if self.state == EngineState::Draining {
                // The drain flush above emitted everything that ever will be
                self.state = EngineState::Stopped;
                break;
            }
        }

        if self.state != EngineState::Stopped {
            // All senders dropped without terminal markers. Well-behaved
            // adapters never do this; finish with what is known.
            warn!("Merge channel closed with live sources; draining");
            for index in 0..self.names.len() {
                self.tracker.close(SourceId(index as u16), false);
            }
            self.emit_eligible(sink).await?;
            self.state = EngineState::Stopped;
        }

        self.summary.final_watermark = self.tracker.progress().bound();
        sink.completed().await.map_err(EngineError::Sink)?;

        info!(
            bars = self.summary.bars_emitted,
            observations = self.summary.observations,
            rejected = self.summary.observations_rejected,
            source_errors = self.summary.source_errors,
            watermark = ?self.summary.final_watermark,
            "Index engine stopped"
        );
        Ok(self.summary)
    }

    fn on_observation(&mut self, obs: Observation) {
        match self.tracker.observe(obs.source, obs.timestamp) {
            Ok(()) => {
                self.aggregator.note_first_observation(obs.timestamp);
                self.prices.record(obs.source, obs.tick());
                self.summary.observations += 1;
                counter!("index_observations_total").increment(1);
            }
            Err(Rejection::OutOfOrder { last }) => {
                warn!(
                    source = %obs.source,
                    name = self.name(obs.source),
                    timestamp = obs.timestamp,
                    last,
                    "Out-of-order observation rejected"
                );
                self.summary.observations_rejected += 1;
                counter!("index_observations_rejected_total").increment(1);
            }
            Err(Rejection::NotActive) => {
                warn!(
                    source = %obs.source,
                    name = self.name(obs.source),
                    "Observation after terminal marker ignored"
                );
                self.summary.observations_rejected += 1;
                counter!("index_observations_rejected_total").increment(1);
            }
        }
    }

    async fn on_terminal<S: BarSink>(
        &mut self,
        source: SourceId,
        last_timestamp: Option<i64>,
        error: Option<String>,
        sink: &mut S,
    ) -> Result<(), EngineError> {
        debug!(
            %source,
            name = self.name(source),
            ?last_timestamp,
            tracked = ?self.tracker.last_timestamp(source),
            "Source terminated"
        );

        let errored = error.is_some();
        self.tracker.close(source, errored);
        gauge!("index_active_sources").set(self.tracker.active_count() as f64);

        if let Some(message) = error {
            warn!(%source, name = self.name(source), %message, "Source errored");
            self.summary.source_errors += 1;
            let name = self.names[source.index()].clone();
            sink.source_error(source, &name, &message)
                .await
                .map_err(EngineError::Sink)?;
        }

        if self.tracker.active_count() == 0 && self.state == EngineState::Running {
            info!("All sources terminated, draining");
            self.state = EngineState::Draining;
        }
        Ok(())
    }

    async fn emit_eligible<S: BarSink>(&mut self, sink: &mut S) -> Result<(), EngineError> {
        let progress = self.tracker.progress();
        if let Some(bound) = progress.bound() {
            gauge!("index_watermark_seconds").set(bound as f64);
        }

        for bar in self.aggregator.poll(progress, &mut self.prices) {
            debug!(minute_start = bar.minute_start, price = bar.index_price, "Bar finalized");
            sink.publish(bar).await.map_err(EngineError::Sink)?;
            self.summary.bars_emitted += 1;
            counter!("index_bars_emitted_total").increment(1);
        }
        Ok(())
    }

    fn name(&self, source: SourceId) -> &str {
        &self.names[source.index()]
    }
}
