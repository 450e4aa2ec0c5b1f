//! Consumers of completed crawl results.
//!
//! A pool hands every [`CrawlResult`] to a [`ResultSink`] right after the response was
//! framed, on the task that drives the connection. Sinks must therefore return quickly;
//! slow consumers go behind a [`ChannelSink`].
//!
//! # Implementations
//!
//! - [`LogSink`]: logs one line per result
//! - [`CollectSink`]: keeps every result in memory
//! - [`FileSink`]: saves bodies of `200` responses below a directory
//! - [`ChannelSink`]: forwards results to a `tokio::sync::mpsc` channel
//! - [`StatsSink`]: counts results by status class, then delegates

mod channel_sink;
mod collect_sink;
mod file_sink;
mod log_sink;
mod stats_sink;

pub use channel_sink::ChannelSink;
pub use collect_sink::CollectSink;
pub use file_sink::FileSink;
pub use log_sink::LogSink;
pub use stats_sink::{SinkStats, StatsSink};

use crate::protocol::{CrawlResult, SinkError};

/// Receives completed results, one at a time.
///
/// `accept` is called exactly once per completed request. Any error returned is fatal
/// to the pool that produced the result.
#[cfg_attr(test, mockall::automock)]
pub trait ResultSink: Send + Sync {
    fn accept(&self, result: CrawlResult) -> Result<(), SinkError>;

    /// Called once the producer is done. The default does nothing.
    fn finish(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn accept(&self, result: CrawlResult) -> Result<(), SinkError> {
        (**self).accept(result)
    }

    fn finish(&self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

impl<S: ResultSink + ?Sized> ResultSink for std::sync::Arc<S> {
    fn accept(&self, result: CrawlResult) -> Result<(), SinkError> {
        (**self).accept(result)
    }

    fn finish(&self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use http::{Response, StatusCode};

    use crate::protocol::{CrawlPath, CrawlResult, ResponseHeader};

    pub(crate) fn result(path: &str, status: u16, body: &'static [u8]) -> CrawlResult {
        let response = Response::builder().status(StatusCode::from_u16(status).unwrap()).body(()).unwrap();
        CrawlResult::new(
            Arc::from("localhost"),
            CrawlPath::new(path).unwrap(),
            ResponseHeader::new(response, ""),
            Bytes::from_static(body),
            Duration::from_millis(1),
            Duration::from_millis(2),
        )
    }
}
