use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::protocol::{CrawlResult, SinkError};
use crate::sink::ResultSink;

/// Forwards results to a channel, so a slow consumer runs on its own task or thread.
///
/// The channel is unbounded because [`ResultSink::accept`] must not wait. Dropping the
/// receiver turns every further result into [`SinkError::Closed`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<CrawlResult>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<CrawlResult>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ResultSink for ChannelSink {
    fn accept(&self, result: CrawlResult) -> Result<(), SinkError> {
        self.sender.send(result).map_err(|_unsent| SinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::result;

    #[tokio::test]
    async fn forwards_in_order() {
        let (sink, mut receiver) = ChannelSink::new();
        sink.accept(result("/a", 200, b"hello")).unwrap();
        sink.accept(result("/b", 404, b"")).unwrap();
        drop(sink);

        assert_eq!(receiver.recv().await.unwrap().path.as_str(), "/a");
        assert_eq!(receiver.recv().await.unwrap().path.as_str(), "/b");
        assert!(receiver.recv().await.is_none());
    }

    #[test]
    fn dropped_receiver_is_an_error() {
        let (sink, receiver) = ChannelSink::new();
        drop(receiver);

        assert!(matches!(sink.accept(result("/a", 200, b"")), Err(SinkError::Closed)));
    }
}
