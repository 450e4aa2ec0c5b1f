//! The crawler only ever sends one kind of request: a bare `GET` with a `Host` header.

use std::sync::Arc;

use crate::protocol::CrawlPath;

/// The head of a `GET` request, encoded as
/// `GET <path> HTTP/1.1\r\nHost: <host>\r\n\r\n` by the request encoder.
#[derive(Debug, Clone)]
pub struct RequestHead {
    path: CrawlPath,
    host: Arc<str>,
}

impl RequestHead {
    pub fn get(path: CrawlPath, host: Arc<str>) -> Self {
        Self { path, host }
    }

    pub fn path(&self) -> &CrawlPath {
        &self.path
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}
