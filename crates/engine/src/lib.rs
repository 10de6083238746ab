//! Stream-merge and bar-finalization engine for OpenIndex
//!
//! This crate turns up to 100 independent, asynchronously-delayed price
//! streams into one-minute index bars, emitted online as soon as each bar
//! is provably final.
//!
//! # Core Components
//!
//! - [`watermark`] - per-source freshness and the global finalization watermark
//! - [`prices`] - per-source price history answering "price as of time T"
//! - [`combine`] - median/mean reduction of per-source prices
//! - [`bars`] - minute-boundary finalization and drain flushing
//! - [`engine`] - the single-consumer merge loop and engine state machine
//! - [`sink`] - the output trait finalized bars are handed to
//!
//! # Key Invariants
//!
//! - The watermark never decreases
//! - A bar is emitted at most once per boundary, in increasing order
//! - A terminated source stops constraining the watermark but its
//!   already-known prices keep serving bars
//! - Per-source faults (out-of-order data, feed errors) never abort the
//!   merge for the remaining sources

pub mod bars;
pub mod combine;
pub mod engine;
pub mod error;
pub mod prices;
pub mod sink;
pub mod watermark;

pub use combine::Combiner;
pub use engine::{EngineSettings, EngineState, EngineSummary, IndexEngine};
pub use error::EngineError;
pub use sink::BarSink;
pub use watermark::Progress;

pub type Result<T> = std::result::Result<T, EngineError>;
