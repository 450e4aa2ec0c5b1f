use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};

use crate::protocol::{CrawlPath, ResponseHeader};

/// One completed request.
///
/// A result is produced exactly once per request whose response was fully framed;
/// aborted requests never produce one.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub host: Arc<str>,
    pub path: CrawlPath,
    pub version: Version,
    pub status: StatusCode,
    pub reason: Box<str>,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Time from writing the request until the response header was parsed
    pub header_elapsed: Duration,
    /// Time from writing the request until the last body byte arrived
    pub elapsed: Duration,
}

impl CrawlResult {
    pub fn new(
        host: Arc<str>,
        path: CrawlPath,
        header: ResponseHeader,
        body: Bytes,
        header_elapsed: Duration,
        elapsed: Duration,
    ) -> Self {
        let (parts, reason) = header.into_parts();
        Self { host, path, version: parts.version, status: parts.status, reason, headers: parts.headers, body, header_elapsed, elapsed }
    }

    /// Returns the reason phrase, or the canonical one when the server sent none.
    pub fn reason(&self) -> &str {
        if self.reason.is_empty() { self.status.canonical_reason().unwrap_or("") } else { &self.reason }
    }
}
