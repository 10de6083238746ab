//! In-memory sink for tests and embedding

use async_trait::async_trait;
use common::{Bar, SourceId};
use engine::BarSink;

/// Buffers everything the engine emits.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub bars: Vec<Bar>,
    pub errors: Vec<(SourceId, String, String)>,
    pub completed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BarSink for MemorySink {
    async fn publish(&mut self, bar: Bar) -> anyhow::Result<()> {
        self.bars.push(bar);
        Ok(())
    }

    async fn source_error(
        &mut self,
        source: SourceId,
        name: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        self.errors
            .push((source, name.to_string(), message.to_string()));
        Ok(())
    }

    async fn completed(&mut self) -> anyhow::Result<()> {
        self.completed = true;
        Ok(())
    }
}
