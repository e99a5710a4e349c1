//! JSON-lines chain follower feed
//!
//! Each non-blank line is one [`ChainEvent`]. Lines starting with `#` are
//! comments. Any other line that does not parse ends the feed with an error,
//! and no event after it is forwarded.

use notary_types::ChainEvent;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Feed error types
#[derive(Debug, Error)]
pub enum FeedError {
    /// A non-comment line is not a chain event
    #[error("malformed feed line {line}: {source}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// Parse failure
        #[source]
        source: serde_json::Error,
    },
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Counters for one pass over a feed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Lines read
    pub lines: usize,
    /// Events forwarded to the writer
    pub events: usize,
}

/// Parse one feed line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str) -> Result<Option<ChainEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Read `reader` to the end, forwarding events into `events`.
///
/// Stops early once the receiving side is gone. Fails on the first malformed
/// line, after forwarding every event before it.
pub async fn read_feed<Rd>(reader: Rd, events: mpsc::Sender<ChainEvent>) -> FeedResult<FeedStats>
where
    Rd: AsyncBufRead + Unpin,
{
    let mut stats = FeedStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        match parse_line(&line) {
            Ok(Some(event)) => {
                if events.send(event).await.is_err() {
                    debug!(line = stats.lines, "writer gone, feed stopped");
                    break;
                }
                stats.events += 1;
            }
            Ok(None) => {}
            Err(source) => {
                error!(line = stats.lines, error = %source, "malformed feed line");
                return Err(FeedError::Malformed {
                    line: stats.lines,
                    source,
                });
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# replay from genesis").unwrap().is_none());
        assert_eq!(
            parse_line(r#"{"roll_backward":{"slot":7}}"#).unwrap(),
            Some(ChainEvent::RollBackward { slot: 7 })
        );
        assert!(parse_line("{not json").is_err());
    }

    #[tokio::test]
    async fn test_read_feed_counts() {
        let feed = b"# header\n{\"roll_backward\":{\"slot\":1}}\n\n{\"roll_forward\":{\"outputs\":[]}}\n";
        let (tx, mut rx) = mpsc::channel(8);
        let stats = read_feed(&feed[..], tx).await.unwrap();

        assert_eq!(stats, FeedStats { lines: 4, events: 2 });
        assert_eq!(rx.recv().await, Some(ChainEvent::RollBackward { slot: 1 }));
        assert_eq!(rx.recv().await, Some(ChainEvent::RollForward { outputs: vec![] }));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_read_feed_fails_on_malformed_line() {
        let feed = b"{\"roll_backward\":{\"slot\":1}}\n{\"roll_backward\":{\"slot\":\"15\"}}\n{\"roll_backward\":{\"slot\":2}}\n";
        let (tx, mut rx) = mpsc::channel(8);
        let err = read_feed(&feed[..], tx).await.unwrap_err();

        assert!(matches!(err, FeedError::Malformed { line: 2, .. }));
        assert_eq!(rx.recv().await, Some(ChainEvent::RollBackward { slot: 1 }));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_read_feed_stops_when_receiver_dropped() {
        let feed = b"{\"roll_backward\":{\"slot\":1}}\n{\"roll_backward\":{\"slot\":2}}\n";
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let stats = read_feed(&feed[..], tx).await.unwrap();
        assert_eq!(stats.events, 0);
        assert_eq!(stats.lines, 1);
    }
}
