use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::protocol::{CrawlResult, SinkError};
use crate::sink::ResultSink;

/// Counts results by status class and total body bytes, then delegates to `S`.
#[derive(Debug, Default)]
pub struct StatsSink<S> {
    inner: S,
    by_class: [AtomicU64; 6],
    bytes: AtomicU64,
}

/// A point-in-time copy of the counters of a [`StatsSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub informational: u64,
    pub success: u64,
    pub redirection: u64,
    pub client_error: u64,
    pub server_error: u64,
    /// Status codes outside 100..=599
    pub other: u64,
    pub bytes: u64,
}

impl SinkStats {
    pub fn total(&self) -> u64 {
        self.informational + self.success + self.redirection + self.client_error + self.server_error + self.other
    }
}

impl fmt::Display for SinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} results (1xx: {}, 2xx: {}, 3xx: {}, 4xx: {}, 5xx: {}, other: {}), {} bytes",
            self.total(),
            self.informational,
            self.success,
            self.redirection,
            self.client_error,
            self.server_error,
            self.other,
            self.bytes
        )
    }
}

impl<S> StatsSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, by_class: Default::default(), bytes: AtomicU64::new(0) }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn snapshot(&self) -> SinkStats {
        let count = |i: usize| self.by_class[i].load(Ordering::Relaxed);
        SinkStats {
            informational: count(1),
            success: count(2),
            redirection: count(3),
            client_error: count(4),
            server_error: count(5),
            other: count(0),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

impl<S: ResultSink> ResultSink for StatsSink<S> {
    fn accept(&self, result: CrawlResult) -> Result<(), SinkError> {
        let class = match result.status.as_u16() / 100 {
            class @ 1..=5 => class as usize,
            _ => 0,
        };
        self.by_class[class].fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(result.body.len() as u64, Ordering::Relaxed);

        self.inner.accept(result)
    }

    fn finish(&self) -> Result<(), SinkError> {
        self.inner.finish()
    }
}
