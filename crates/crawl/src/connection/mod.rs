//! Client connection handling module
//!
//! This module owns the request/response cycle over one TCP connection.
//!
//! # Components
//!
//! - [`Connector`]: Resolves hosts and opens TCP streams; [`TcpConnector`] is the default
//! - [`CrawlConnection`]: Drives one persistent connection:
//!   - Pulls the next path from the work queue
//!   - Writes the `GET` request
//!   - Frames the response and hands the result to the sink
//!   - Reuses the socket or closes it, depending on the response
//!
//! A connection never retries by itself. When it fails, the path it was working on
//! stays available through [`CrawlConnection::unfinished_path`] and the pool decides
//! what happens next.

mod connector;
mod crawl_connection;

pub use connector::Connector;
pub use connector::TcpConnector;
pub use connector::connect_any;
pub use crawl_connection::ConnectionContext;
pub use crawl_connection::ConnectionState;
pub use crawl_connection::CrawlConnection;

#[cfg(test)]
pub use connector::MockConnector;
