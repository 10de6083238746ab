//! Stream adapter: one task per feed, forwarding into the merge channel
//!
//! The adapter does not interpret prices. It tags each tick with its source,
//! pushes it into the bounded fan-in channel (blocking there when the merge
//! consumer is behind, which transitively slows the feed), and finishes with
//! exactly one terminal marker. On shutdown it abandons the feed read and
//! terminates as if the stream had closed.

use crate::{FeedError, PriceFeed};
use common::{FeedEvent, Observation, SourceId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawn the forwarding task for one feed.
///
/// The task ends after delivering the terminal marker, or silently when the
/// engine side of the channel is gone.
pub fn spawn_adapter(
    source: SourceId,
    mut feed: Box<dyn PriceFeed>,
    tx: mpsc::Sender<FeedEvent>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_timestamp: Option<i64> = None;
        let mut error: Option<FeedError> = None;

        loop {
            let item = tokio::select! {
                _ = token.cancelled() => {
                    info!(%source, feed = feed.name(), "Shutdown requested, closing feed");
                    break;
                }
                item = feed.next() => item,
            };

            match item {
                Some(Ok(tick)) => {
                    last_timestamp = Some(tick.timestamp);
                    let event =
                        FeedEvent::Observation(Observation::new(source, tick.timestamp, tick.price));
                    if tx.send(event).await.is_err() {
                        debug!(%source, "Merge channel closed, dropping adapter");
                        return;
                    }
                }
                Some(Err(e)) => {
                    warn!(%source, feed = feed.name(), error = %e, "Feed terminated with error");
                    error = Some(e);
                    break;
                }
                None => {
                    debug!(%source, feed = feed.name(), "Feed closed");
                    break;
                }
            }
        }

        let terminal = FeedEvent::Terminal {
            source,
            last_timestamp,
            error: error.map(|e| e.to_string()),
        };
        if tx.send(terminal).await.is_err() {
            debug!(%source, "Merge channel closed before terminal marker");
        }
    })
}
