//! Bounded pools of crawl connections.
//!
//! A [`CrawlerPool`] owns the connection lifecycle against one host: it probes the host
//! with a retry budget, runs connections in batches of at most
//! [`PoolConfig::concurrency`], hands aborted paths back to the shared queue and
//! reports a [`RunSummary`] once the queue is drained.

mod config;
mod crawler_pool;
mod summary;

pub use config::PoolConfig;
pub use crawler_pool::CrawlerPool;
pub use summary::RunSummary;
