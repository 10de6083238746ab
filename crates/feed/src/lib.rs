//! Price feeds for OpenIndex
//!
//! A feed is one exchange's price stream: a lazy sequence of ticks,
//! strictly increasing in timestamp, that ends by closing or with an error.
//! The stream adapter wraps a feed in a task that forwards everything into
//! the engine's fan-in channel.
//!
//! # Components
//!
//! - [`PriceFeed`] - the feed trait real connectors implement
//! - [`adapter`] - one forwarding task per feed
//! - [`mock`] - scripted and random-walk feeds for tests and demos
//! - [`shutdown`] - Ctrl+C-aware cancellation for adapter tasks

use async_trait::async_trait;
use common::Tick;
use thiserror::Error;

pub mod adapter;
pub mod mock;
pub mod shutdown;

pub use adapter::spawn_adapter;
pub use mock::{RandomWalkFeed, ScriptedFeed};
pub use shutdown::ShutdownController;

/// Errors a feed can terminate with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The upstream connection dropped
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// The upstream sent something unusable
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// One exchange's price stream.
///
/// Contract: ticks are strictly increasing in timestamp. `None` means the
/// stream closed cleanly; an `Err` item is the stream's final word - no
/// further calls will yield data. An error never invalidates prior ticks.
#[async_trait]
pub trait PriceFeed: Send {
    /// Next tick, end-of-stream, or terminal error
    async fn next(&mut self) -> Option<Result<Tick, FeedError>>;

    /// Human-readable feed name for logging
    fn name(&self) -> &str;
}
