//! Engine error types

use common::MAX_SOURCES;
use thiserror::Error;

/// Errors that abort an engine run.
///
/// Per-source faults are deliberately absent: out-of-order observations and
/// feed errors are handled inline and never tear the merge down.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Settings that cannot produce a meaningful engine
    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),

    /// More sources than the engine supports
    #[error("Too many sources: {0} (maximum is {MAX_SOURCES})")]
    TooManySources(usize),

    /// An engine needs at least one source
    #[error("No sources registered")]
    NoSources,

    /// The sink refused a bar or the completion notification
    #[error("Sink failure: {0}")]
    Sink(#[source] anyhow::Error),
}
