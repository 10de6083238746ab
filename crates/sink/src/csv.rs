//! CSV file sink

use async_trait::async_trait;
use common::{Bar, SourceId};
use engine::BarSink;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

/// Appends `<unix_timestamp>,<index_price>` lines to a file, flushed on
/// completion and after every bar (bars are rare; losing one to a crash
/// would be worse than the syscall).
#[derive(Debug)]
pub struct CsvSink {
    writer: BufWriter<File>,
    path: PathBuf,
    bars: u64,
}

impl CsvSink {
    pub async fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        info!(path = %path.display(), "CSV sink writing");
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            bars: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BarSink for CsvSink {
    async fn publish(&mut self, bar: Bar) -> anyhow::Result<()> {
        self.writer
            .write_all(format!("{}\n", bar).as_bytes())
            .await?;
        self.writer.flush().await?;
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
        self.writer.flush().await?;
        info!(path = %self.path.display(), bars = self.bars, "CSV sink complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_one_line_per_bar() {
        let dir = std::env::temp_dir().join("openindex-csv-sink-test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("bars.csv");

        let mut sink = CsvSink::create(&path).await.unwrap();
        sink.publish(Bar::new(1577836800, 100.1)).await.unwrap();
        sink.publish(Bar::new(1577836860, 102.0)).await.unwrap();
        sink.completed().await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "1577836800,100.1\n1577836860,102\n");

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
