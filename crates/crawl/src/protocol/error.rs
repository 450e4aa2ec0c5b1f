use std::io;
use std::time::Duration;
use thiserror::Error;

/// Fatal errors of a crawler pool run.
///
/// Transient per-connection failures never surface here; they are logged and the
/// affected path is requeued.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("unable to resolve {host}:{port}: {source}")]
    Resolve { host: String, port: u16, source: io::Error },

    #[error("unable to connect to {host}:{port} after {attempts} attempts: {source}")]
    Unreachable { host: String, port: u16, attempts: u32, source: io::Error },

    #[error("no progress on any connection for {idle:?}")]
    Stalled { idle: Duration },

    #[error("result sink error: {source}")]
    Sink {
        #[from]
        source: SinkError,
    },
}

impl CrawlError {
    pub fn resolve<S: ToString>(host: S, port: u16, source: io::Error) -> Self {
        Self::Resolve { host: host.to_string(), port, source }
    }

    pub fn unreachable<S: ToString>(host: S, port: u16, attempts: u32, source: io::Error) -> Self {
        Self::Unreachable { host: host.to_string(), port, attempts, source }
    }

    /// Returns true for errors raised before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("concurrency must be greater than 0")]
    ZeroConcurrency,

    #[error("retry budget must be greater than 0")]
    ZeroRetry,

    #[error("max attempts per path must be greater than 0")]
    ZeroAttempts,

    #[error("path list is empty")]
    EmptyPaths,

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}

impl ConfigError {
    pub fn invalid_host<H: ToString, S: ToString>(host: H, reason: S) -> Self {
        Self::InvalidHost { host: host.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_path<P: ToString, S: ToString>(path: P, reason: S) -> Self {
        Self::InvalidPath { path: path.to_string(), reason: reason.to_string() }
    }
}

/// Errors of a single connection.
///
/// Everything except [`ConnectionError::Sink`] is transient: the connection is closed
/// and its in-flight path goes back to the work queue.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connect error: {source}")]
    Connect { source: io::Error },

    #[error("response error: {source}")]
    Response {
        #[from]
        source: ParseError,
    },

    #[error("request error: {source}")]
    Request {
        #[from]
        source: SendError,
    },

    #[error("remote closed the connection while a request was in flight")]
    RemoteClosed,

    #[error("sink error: {source}")]
    Sink {
        #[from]
        source: SinkError,
    },
}

impl ConnectionError {
    pub fn connect<E: Into<io::Error>>(e: E) -> Self {
        Self::Connect { source: e.into() }
    }

    /// Returns true if the error must stop the whole pool.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Sink { .. })
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid status line: {reason}")]
    InvalidStatusLine { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("stream closed after {buffered} bytes of an incomplete header")]
    IncompleteHeader { buffered: usize },

    #[error("stream closed before the body was complete")]
    IncompleteBody,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_status_line<S: ToString>(str: S) -> Self {
        Self::InvalidStatusLine { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink is closed")]
    Closed,

    #[error("sink rejected result for {path}: {reason}")]
    Rejected { path: String, reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SinkError {
    pub fn rejected<P: ToString, S: ToString>(path: P, reason: S) -> Self {
        Self::Rejected { path: path.to_string(), reason: reason.to_string() }
    }
}
