//! Console sink: one `<unix_timestamp>,<index_price>` line per bar

use async_trait::async_trait;
use chrono::DateTime;
use common::{Bar, SourceId};
use engine::BarSink;
use tracing::{debug, info, warn};

/// Prints finalized bars to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    bars: u64,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BarSink for ConsoleSink {
    async fn publish(&mut self, bar: Bar) -> anyhow::Result<()> {
        println!("{}", bar);
        if let Some(minute) = DateTime::from_timestamp(bar.minute_start, 0) {
            debug!(minute = %minute.to_rfc3339(), price = bar.index_price, "Bar printed");
        }
        self.bars += 1;
        Ok(())
    }

    async fn source_error(
        &mut self,
        source: SourceId,
        name: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        warn!(%source, name, message, "Source dropped out");
        Ok(())
    }

    async fn completed(&mut self) -> anyhow::Result<()> {
        info!(bars = self.bars, "Index stream complete");
        Ok(())
    }
}
