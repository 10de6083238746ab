//! Configuration for OpenIndex
//!
//! The configuration file is YAML with four sections:
//!
//! - `engine`: bar width, finalization margin, combine method, queue size
//! - `sources`: the price streams to merge (mock kinds for now; real
//!   exchange connectors plug in behind the same feed trait)
//! - `sink`: where finalized bars go (console or CSV file)
//! - `monitoring`: optional Prometheus exporter port
//!
//! `${ENV_VAR}` placeholders in the file are substituted before parsing.

use common::{CombineMethod, Tick};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Top-level configuration for an OpenIndex run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub engine: EngineSection,
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub sink: SinkSection,
    #[serde(default)]
    pub monitoring: Option<MonitoringSection>,
}

/// Merge-engine tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSection {
    /// Width of one bar in seconds
    #[serde(default = "default_bar_width_secs")]
    pub bar_width_secs: i64,

    /// How far the watermark must clear a boundary before the bar is
    /// finalized. Defaults to the bar width; tightening it trades safety
    /// for latency (the validator warns).
    #[serde(default)]
    pub safety_margin_secs: Option<i64>,

    /// How per-source prices are combined into the index value
    #[serde(default)]
    pub combine: CombineMethod,

    /// Capacity of the bounded fan-in queue; adapters block when it is full
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl EngineSection {
    /// The effective margin: configured value or the bar width
    pub fn safety_margin(&self) -> i64 {
        self.safety_margin_secs.unwrap_or(self.bar_width_secs)
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            bar_width_secs: default_bar_width_secs(),
            safety_margin_secs: None,
            combine: CombineMethod::default(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// One configured price source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: SourceKind,
}

/// The kind of feed backing a source
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// Seeded random walk, the mock stream used for demos and soak runs
    RandomWalk {
        seed: u64,
        #[serde(default = "default_start_price")]
        start_price: f64,
        #[serde(default = "default_tick_count")]
        ticks: u32,
        /// Wall-clock pacing between ticks; 0 replays as fast as possible
        #[serde(default)]
        tick_interval_ms: u64,
        /// First tick timestamp; defaults to the wall clock at startup
        #[serde(default)]
        start_timestamp: Option<i64>,
    },

    /// Fixed tick list, optionally ending with a feed error
    Scripted {
        ticks: Vec<Tick>,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        tick_interval_ms: u64,
    },
}

impl SourceKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SourceKind::RandomWalk { .. } => "random_walk",
            SourceKind::Scripted { .. } => "scripted",
        }
    }
}

/// Where finalized bars are delivered
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkSection {
    /// `<unix_timestamp>,<index_price>` lines on stdout
    #[default]
    Console,
    /// Same lines appended to a file
    Csv { path: PathBuf },
}

/// Optional Prometheus exporter
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringSection {
    pub metrics_port: u16,
}
