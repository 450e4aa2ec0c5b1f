//! An asynchronous, bounded-concurrency HTTP/1.1 crawler
//!
//! This crate fetches a large, enumerable set of paths from a host over persistent
//! connections and hands every completed response to a pluggable sink. It is built on
//! top of tokio and frames responses with `tokio_util` codecs.
//!
//! # Features
//!
//! - Persistent HTTP/1.1 connections, reused until the server closes them
//! - Content-length, chunked and close-delimited response bodies
//! - A fixed number of concurrent connections per pool
//! - Probe retries before crawling, requeueing of aborted paths after each batch
//! - Several pools sharing one work queue and one sink
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use micro_crawl::pool::{CrawlerPool, PoolConfig};
//! use micro_crawl::protocol::CrawlPath;
//! use micro_crawl::queue::WorkQueue;
//! use micro_crawl::sink::LogSink;
//! use tracing::{Level, error, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let paths = ["/wiki/Main_Page", "/wiki/Rust"].map(|p| CrawlPath::new(p).unwrap());
//!     let queue = Arc::new(WorkQueue::from_paths(paths));
//!     queue.close();
//!
//!     let config = PoolConfig::new("en.wikipedia.org").with_concurrency(2);
//!     let pool = CrawlerPool::new(config, queue, Arc::new(LogSink::new()));
//!
//!     match pool.run().await {
//!         Ok(summary) => info!(%summary, "done"),
//!         Err(e) => error!(cause = %e, "crawl failed"),
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`protocol`]: Paths, response headers, results and error types
//! - [`codec`]: Request encoding and response framing
//! - [`connection`]: One persistent connection and its request/response cycle
//! - [`queue`]: The work queue shared by every connection
//! - [`pool`]: Batches of connections against one host
//! - [`sink`]: Consumers of completed results
//!
//! # Limitations
//!
//! - Only `GET` requests with a `Host` header are sent
//! - HTTP/1.0 and HTTP/1.1 only, no TLS
//! - Redirects are not followed
//! - Maximum header size: 64KB
//! - Maximum number of headers: 100

pub mod codec;
pub mod connection;
pub mod pool;
pub mod protocol;
pub mod queue;
pub mod sink;

mod utils;
pub(crate) use utils::ensure;
