//! Common types used across OpenIndex
//!
//! This module provides the fundamental domain types shared between the
//! feed, engine, and sink crates.

use serde::{Deserialize, Serialize};

/// Maximum number of price sources a single engine instance accepts.
pub const MAX_SOURCES: usize = 100;

/// Dense index identifying one price source.
///
/// Sources are registered up front and addressed as slots in array-backed
/// tables, so the identifier is a small integer rather than a name or UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u16);

impl SourceId {
    /// Slot index for table addressing
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for SourceId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// One price sample as produced by a feed: (epoch seconds, price).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: i64,
    pub price: f64,
}

impl Tick {
    pub fn new(timestamp: i64, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// A tick tagged with the source that produced it. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub source: SourceId,
    pub timestamp: i64,
    pub price: f64,
}

impl Observation {
    pub fn new(source: SourceId, timestamp: i64, price: f64) -> Self {
        Self {
            source,
            timestamp,
            price,
        }
    }

    pub fn tick(&self) -> Tick {
        Tick::new(self.timestamp, self.price)
    }
}

/// Lifecycle status of a source as seen by the merge engine.
///
/// Closed and Errored sources no longer constrain the watermark, but their
/// already-known prices keep contributing to bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Active,
    Closed,
    Errored,
}

impl SourceStatus {
    /// True while the source still constrains the watermark
    pub fn is_live(&self) -> bool {
        matches!(self, SourceStatus::Active)
    }
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceStatus::Active => write!(f, "active"),
            SourceStatus::Closed => write!(f, "closed"),
            SourceStatus::Errored => write!(f, "errored"),
        }
    }
}

/// Event delivered from a stream adapter to the merge engine.
///
/// Data and termination travel through the same channel so the merge logic
/// is a pure state machine over a single event stream per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// One price observation from a source
    Observation(Observation),

    /// The source's stream ended; no further observations will follow
    Terminal {
        source: SourceId,
        /// Timestamp of the last observation the adapter forwarded, if any
        last_timestamp: Option<i64>,
        /// Present when the stream ended with a feed error
        error: Option<String>,
    },
}

impl FeedEvent {
    pub fn source(&self) -> SourceId {
        match self {
            FeedEvent::Observation(obs) => obs.source,
            FeedEvent::Terminal { source, .. } => *source,
        }
    }
}

/// Rule for turning per-source last-known prices into one index value.
///
/// Median is the default: robust against a single misbehaving or stale
/// exchange without an explicit outlier-detection pass. Mean is the simpler
/// alternative with weaker robustness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMethod {
    #[default]
    Median,
    Mean,
}

impl std::fmt::Display for CombineMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CombineMethod::Median => write!(f, "median"),
            CombineMethod::Mean => write!(f, "mean"),
        }
    }
}

/// One finalized index bar: a minute-aligned timestamp and the combined
/// index price for that minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the bar interval (epoch seconds, multiple of the bar width)
    pub minute_start: i64,
    pub index_price: f64,
}

impl Bar {
    pub fn new(minute_start: i64, index_price: f64) -> Self {
        Self {
            minute_start,
            index_price,
        }
    }
}

impl std::fmt::Display for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.minute_start, self.index_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_display_and_index() {
        let id = SourceId(7);
        assert_eq!(id.to_string(), "source#7");
        assert_eq!(id.index(), 7);
    }

    #[test]
    fn test_status_liveness() {
        assert!(SourceStatus::Active.is_live());
        assert!(!SourceStatus::Closed.is_live());
        assert!(!SourceStatus::Errored.is_live());
    }

    #[test]
    fn test_feed_event_source() {
        let obs = FeedEvent::Observation(Observation::new(SourceId(2), 60, 101.5));
        assert_eq!(obs.source(), SourceId(2));

        let term = FeedEvent::Terminal {
            source: SourceId(3),
            last_timestamp: Some(120),
            error: None,
        };
        assert_eq!(term.source(), SourceId(3));
    }

    #[test]
    fn test_bar_display_matches_output_form() {
        let bar = Bar::new(1577836800, 100.1);
        assert_eq!(bar.to_string(), "1577836800,100.1");
    }
}
