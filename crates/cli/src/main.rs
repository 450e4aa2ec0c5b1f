//! micro-crawl - crawl a path list over persistent HTTP/1.1 connections
//!
//! Exit codes: `0` once every path was handled, `2` for invalid arguments or path
//! files, `1` for unreachable hosts, sink failures and termination by signal.

mod config;
mod error;
mod paths;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use micro_crawl::pool::{CrawlerPool, RunSummary};
use micro_crawl::protocol::{ConfigError, CrawlError, SinkError};
use micro_crawl::queue::WorkQueue;
use micro_crawl::sink::{ChannelSink, FileSink, LogSink, ResultSink, StatsSink};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{CliArgs, CrawlConfig, SinkKind};
use crate::error::InputError;
use crate::paths::load_paths;

type Sink = StatsSink<Box<dyn ResultSink>>;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = setup_logging(&args.log_level) {
        eprintln!("Error: {e:#}");
        return ExitCode::from(2);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

fn setup_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?,
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

/// `2` when the arguments or the path file were rejected, `1` for any other failure.
fn exit_status(e: &anyhow::Error) -> u8 {
    let invalid_input = e.chain().any(|cause| {
        cause.is::<InputError>()
            || cause.is::<ConfigError>()
            || cause.downcast_ref::<CrawlError>().is_some_and(CrawlError::is_config)
    });
    if invalid_input { 2 } else { 1 }
}

async fn run(args: CliArgs) -> Result<()> {
    let config = CrawlConfig::from_args(args).context("invalid configuration")?;
    let paths = load_paths(&config.file, config.start, config.count)?;

    let queue = Arc::new(WorkQueue::from_paths(paths));
    queue.close();
    info!(paths = queue.len(), hosts = config.hosts.len(), pools = config.pools, "loaded path list");

    let (sink, writer) = build_sink(&config);
    let cancel = CancellationToken::new();
    tokio::spawn(terminate_on_signal(cancel.clone()));

    let mut pools = JoinSet::new();
    for host in &config.hosts {
        for _ in 0..config.pools {
            let id = pools.len() + 1;
            let pool_sink: Arc<dyn ResultSink> = Arc::<Sink>::clone(&sink);
            let pool = CrawlerPool::new(host.clone(), Arc::clone(&queue), pool_sink)
                .with_id(id)
                .with_cancellation(cancel.child_token());
            pools.spawn(async move { pool.run().await });
        }
    }

    let mut summary = RunSummary::default();
    let mut failure = None;
    while let Some(joined) = pools.join_next().await {
        match joined.context("crawler pool panicked")? {
            Ok(pool_summary) => summary += pool_summary,
            Err(e) => {
                error!(cause = %e, "crawler pool failed");
                failure.get_or_insert(e);
            }
        }
    }

    info!(%summary, "crawl finished");
    info!(stats = %sink.snapshot(), "responses");
    for path in queue.abandoned() {
        warn!(%path, "abandoned");
    }

    sink.finish().context("unable to finish result sink")?;
    drop(sink);
    if let Some(writer) = writer {
        writer.await.context("file writer panicked")?.context("unable to save results")?;
    }

    if let Some(e) = failure {
        return Err(e).context("crawl failed");
    }
    if summary.terminated {
        bail!("crawl terminated by signal, {} paths left", queue.len());
    }
    Ok(())
}

/// Builds the sink the pools share. Files are written on a blocking thread fed through a channel.
fn build_sink(config: &CrawlConfig) -> (Arc<Sink>, Option<JoinHandle<Result<(), SinkError>>>) {
    let mut writer = None;
    let inner: Box<dyn ResultSink> = match config.sink {
        SinkKind::Log => Box::new(LogSink::new()),
        SinkKind::Quiet => Box::new(LogSink::quiet()),
        SinkKind::Files => {
            let (channel, mut receiver) = ChannelSink::new();
            let files = FileSink::new(&config.output_dir);
            info!(dir = %files.root().display(), "saving responses");

            writer = Some(tokio::task::spawn_blocking(move || {
                while let Some(result) = receiver.blocking_recv() {
                    files.accept(result)?;
                }
                files.finish()
            }));
            Box::new(channel)
        }
    };

    (Arc::new(StatsSink::new(inner)), writer)
}

async fn terminate_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(cause = %e, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(cause = %e, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }

    warn!("caught signal, terminating crawler pools");
    cancel.cancel();
}
