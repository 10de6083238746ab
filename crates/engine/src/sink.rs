//! Sink interface
//!
//! The engine's only output boundary. Implementations decide what emission
//! means (stdout, file, database); the engine guarantees bars arrive at
//! most once per boundary and in increasing order, and that `completed` is
//! called exactly once when the engine stops.

use async_trait::async_trait;
use common::{Bar, SourceId};

/// Consumer of finalized bars and engine lifecycle notifications.
#[async_trait]
pub trait BarSink: Send {
    /// One finalized bar. Errors abort the engine run.
    async fn publish(&mut self, bar: Bar) -> anyhow::Result<()>;

    /// A source terminated with a feed error. Informational: the engine has
    /// already excluded the source and keeps running.
    async fn source_error(
        &mut self,
        source: SourceId,
        name: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        let _ = (source, name, message);
        Ok(())
    }

    /// No more bars will follow.
    async fn completed(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
