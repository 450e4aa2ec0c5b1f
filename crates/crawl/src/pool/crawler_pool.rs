use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use futures::stream::FuturesUnordered;
use tokio::select;
use tokio::sync::Notify;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::connection::{ConnectionContext, Connector, CrawlConnection, TcpConnector, connect_any};
use crate::pool::{PoolConfig, RunSummary};
use crate::protocol::{ConnectionError, CrawlError, SinkError};
use crate::queue::{Requeue, WorkItem, WorkQueue};
use crate::sink::ResultSink;

/// How one connection of a batch ended.
enum Outcome {
    /// The connection could not be opened, no path was taken
    NotOpened,
    Finished { completed: u64, unfinished: Option<WorkItem> },
}

/// Crawls the shared queue against one host with a bounded number of connections.
///
/// A run probes the host, then works in batches: each batch opens
/// `min(concurrency, queue length)` connections and drives them all on the calling task
/// until every one of them closed. Paths aborted by a failing connection go back to the
/// queue once the batch is over.
///
/// Several pools may share one queue and one sink, e.g. one pool per host.
pub struct CrawlerPool {
    id: usize,
    config: PoolConfig,
    queue: Arc<WorkQueue>,
    sink: Arc<dyn ResultSink>,
    connector: Arc<dyn Connector>,
    cancel: CancellationToken,
}

impl fmt::Debug for CrawlerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlerPool")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("queue", &self.queue)
            .field("terminated", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl CrawlerPool {
    pub fn new(config: PoolConfig, queue: Arc<WorkQueue>, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            id: 0,
            config,
            queue,
            sink,
            connector: Arc::new(TcpConnector),
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the id shown in this pool's log span.
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Ties termination to `cancel`, so one token can stop several pools.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Stops the pool: no new batch is started and every live connection is closed.
    ///
    /// Paths in flight are lost, they are not requeued.
    pub fn terminate(&self) {
        info!(pool = self.id, "terminate crawler pool");
        self.cancel.cancel();
    }

    pub fn is_terminated(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Crawls until the queue is empty or the pool is terminated.
    pub async fn run(&self) -> Result<RunSummary, CrawlError> {
        let span = info_span!("pool", id = self.id, host = %self.config.host(), port = self.config.port());
        self.crawl().instrument(span).await
    }

    async fn crawl(&self) -> Result<RunSummary, CrawlError> {
        self.config.validate()?;
        if self.queue.is_empty() {
            info!("no path to crawl, host is not probed");
            return Ok(RunSummary::default());
        }
        info!(concurrency = self.config.concurrency(), paths = self.queue.len(), "start crawling");

        let mut addrs = self.probe().await?;
        let mut summary = RunSummary::default();
        let progress = Notify::new();
        let mut next_id = 0;

        while !self.cancel.is_cancelled() && !self.queue.is_empty() {
            let size = self.config.concurrency().min(self.queue.len());
            summary.batches += 1;
            debug!(batch = summary.batches, size, "start batch");

            let ctx = ConnectionContext { queue: &self.queue, sink: &*self.sink, progress: &progress, cancel: &self.cancel };
            let mut batch = FuturesUnordered::new();
            for _ in 0..size {
                next_id += 1;
                batch.push(self.connection(next_id, &addrs, ctx).instrument(info_span!("connection", id = next_id)));
            }

            let mut opened = 0;
            let mut unfinished = Vec::new();
            while let Some(outcome) = self.next_outcome(&mut batch, &progress).await? {
                if let Outcome::Finished { completed, unfinished: item } = outcome {
                    opened += 1;
                    summary.completed += completed;
                    unfinished.extend(item);
                }
            }
            drop(batch);
            summary.connections += opened;

            if self.cancel.is_cancelled() {
                for item in unfinished {
                    warn!(path = %item.path(), "in-flight path lost on termination");
                }
                break;
            }

            for item in unfinished {
                match self.queue.requeue(item, self.config.max_attempts()) {
                    Requeue::Requeued => summary.requeued += 1,
                    Requeue::Abandoned => summary.abandoned += 1,
                }
            }

            if opened == 0 {
                warn!(batch = summary.batches, "no connection of the batch could be opened, probing again");
                addrs = self.probe().await?;
            }
        }

        summary.terminated = self.cancel.is_cancelled();
        info!(%summary, "finished crawling");
        Ok(summary)
    }

    /// Waits for the next connection of the batch to end.
    ///
    /// With an idle timeout, fails when no connection reports progress in time.
    async fn next_outcome<S>(&self, batch: &mut S, progress: &Notify) -> Result<Option<Outcome>, CrawlError>
    where
        S: Stream<Item = Result<Outcome, SinkError>> + Unpin,
    {
        let Some(idle) = self.config.idle_timeout() else {
            return Ok(batch.next().await.transpose()?);
        };

        loop {
            select! {
                outcome = batch.next() => return Ok(outcome.transpose()?),
                _ = progress.notified() => continue,
                _ = sleep(idle) => {
                    error!(?idle, "no progress on any connection");
                    return Err(CrawlError::Stalled { idle });
                }
            }
        }
    }

    /// Opens one connection and runs it to its end.
    ///
    /// Only sink errors are returned, they stop the pool. Transient errors are logged and
    /// leave the in-flight path in the outcome.
    async fn connection(&self, id: u64, addrs: &[SocketAddr], ctx: ConnectionContext<'_>) -> Result<Outcome, SinkError> {
        let host = self.config.shared_host();
        let mut conn = match CrawlConnection::open(id, host, &*self.connector, addrs, self.config.read_buffer()).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(cause = %e, "unable to open connection");
                return Ok(Outcome::NotOpened);
            }
        };
        ctx.progress.notify_one();

        match conn.run(ctx).await {
            Ok(()) => debug!(completed = conn.completed(), "connection closed"),
            Err(ConnectionError::Sink { source }) => return Err(source),
            Err(e) => warn!(cause = %e, path = ?conn.unfinished_path().map(|p| p.as_str()), "connection failed"),
        }

        Ok(Outcome::Finished { completed: conn.completed(), unfinished: conn.take_unfinished() })
    }

    /// Checks that the host resolves and accepts a connection, with `retry` attempts.
    ///
    /// A name that does not resolve is fatal right away.
    async fn probe(&self) -> Result<Vec<SocketAddr>, CrawlError> {
        let (host, port) = (self.config.host(), self.config.port());

        let addrs = match self.connector.resolve(host, port).await {
            Ok(addrs) => addrs,
            Err(e) => {
                error!(cause = %e, "unable to resolve host");
                return Err(CrawlError::resolve(host, port, e));
            }
        };

        let retry = self.config.retry();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match connect_any(&*self.connector, &addrs).await {
                Ok(_probe) => {
                    debug!(attempt, "host is reachable");
                    return Ok(addrs);
                }
                Err(e) if attempt >= retry => {
                    error!(cause = %e, attempt, "unable to connect, giving up");
                    return Err(CrawlError::unreachable(host, port, attempt, e));
                }
                Err(e) => {
                    warn!(cause = %e, attempts_left = retry - attempt, "unable to connect");
                    if !self.config.retry_delay().is_zero() {
                        sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }
    }
}
