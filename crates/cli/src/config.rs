//! Command line arguments and the validated crawl configuration built from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use micro_crawl::pool::PoolConfig;
use micro_crawl::protocol::ConfigError;

use crate::error::InputError;

/// Crawl a list of paths from one or more hosts over persistent HTTP/1.1 connections
#[derive(Parser, Debug, Clone)]
#[command(
    name = "micro-crawl",
    version,
    about,
    after_help = "EXAMPLES:\n    \
        micro-crawl -H upload.wikimedia.org -f pages.txt -c 1000 -a 10\n    \
        micro-crawl -H ib1 -H ib2 -f pages.txt -t 2 --sink files -o dump"
)]
pub struct CliArgs {
    /// Host to crawl, repeat for several hosts
    #[arg(short = 'H', long = "host", required = true, value_name = "HOST", action = clap::ArgAction::Append)]
    pub hosts: Vec<String>,

    /// Port number
    #[arg(short, long, default_value_t = PoolConfig::DEFAULT_PORT)]
    pub port: u16,

    /// Path file, one path per line
    #[arg(short, long, default_value = "pages.txt", value_name = "FILE")]
    pub file: PathBuf,

    /// Index of the first line to use
    #[arg(short, long, default_value_t = 0)]
    pub start: usize,

    /// Number of lines to use (all remaining lines if not set)
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Number of crawler pools per host
    #[arg(short = 't', long, default_value_t = 1, value_name = "NUM")]
    pub pools: usize,

    /// Number of concurrent connections per pool
    #[arg(short = 'a', long, default_value_t = PoolConfig::DEFAULT_CONCURRENCY, value_name = "NUM")]
    pub concurrency: usize,

    /// Number of connection attempts before a host is given up
    #[arg(short, long, default_value_t = PoolConfig::DEFAULT_RETRY, value_name = "NUM")]
    pub retry: u32,

    /// Milliseconds to wait between two connection attempts
    #[arg(long, default_value_t = 0, value_name = "MS")]
    pub retry_delay: u64,

    /// Number of times a path is requested before it is abandoned
    #[arg(long, default_value_t = PoolConfig::DEFAULT_MAX_ATTEMPTS, value_name = "NUM")]
    pub max_attempts: u32,

    /// Seconds without progress after which a pool gives up
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,

    /// Log level or filter directive, overridden by RUST_LOG
    #[arg(short, long, default_value = "info", value_name = "LEVEL")]
    pub log_level: String,

    /// What to do with the responses
    #[arg(long, value_enum, default_value_t = SinkKind::Log)]
    pub sink: SinkKind,

    /// Directory for saved bodies with `--sink files`
    #[arg(short, long, default_value = "pages", value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Log one line per response
    Log,
    /// Only log the final statistics
    Quiet,
    /// Save bodies of 200 responses below the output directory
    Files,
}

/// Validated configuration of one crawler run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub hosts: Vec<PoolConfig>,
    pub pools: usize,
    pub file: PathBuf,
    pub start: usize,
    pub count: Option<usize>,
    pub sink: SinkKind,
    pub output_dir: PathBuf,
}

impl CrawlConfig {
    pub fn from_args(args: CliArgs) -> Result<Self, InputError> {
        if args.pools == 0 {
            return Err(InputError::ZeroPools);
        }
        if args.count == Some(0) {
            return Err(ConfigError::EmptyPaths.into());
        }

        let hosts = args
            .hosts
            .iter()
            .map(|host| {
                let config = PoolConfig::new(host)
                    .with_port(args.port)
                    .with_concurrency(args.concurrency)
                    .with_retry(args.retry)
                    .with_retry_delay(Duration::from_millis(args.retry_delay))
                    .with_max_attempts(args.max_attempts)
                    .with_idle_timeout(args.idle_timeout.map(Duration::from_secs));
                config.validate().map(|()| config)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            hosts,
            pools: args.pools,
            file: args.file,
            start: args.start,
            count: args.count,
            sink: args.sink,
            output_dir: args.output_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CrawlConfig, InputError> {
        let args = CliArgs::try_parse_from(std::iter::once("micro-crawl").chain(args.iter().copied())).unwrap();
        CrawlConfig::from_args(args)
    }

    #[test]
    fn defaults() {
        let config = parse(&["-H", "ib1"]).unwrap();

        assert_eq!(config.hosts.len(), 1);
        assert_eq!(config.hosts[0].host(), "ib1");
        assert_eq!(config.hosts[0].port(), 80);
        assert_eq!(config.hosts[0].concurrency(), 4);
        assert_eq!(config.hosts[0].retry(), 7);
        assert_eq!(config.pools, 1);
        assert_eq!(config.file, PathBuf::from("pages.txt"));
        assert_eq!((config.start, config.count), (0, None));
        assert_eq!(config.sink, SinkKind::Log);
    }

    #[test]
    fn several_hosts_share_settings() {
        let config =
            parse(&["-H", "ib1", "--host", "ib2", "-p", "8080", "-a", "10", "-t", "2", "--idle-timeout", "30", "--sink", "files"])
                .unwrap();

        let hosts: Vec<_> = config.hosts.iter().map(|h| (h.host(), h.port(), h.concurrency())).collect();
        assert_eq!(hosts, vec![("ib1", 8080, 10), ("ib2", 8080, 10)]);
        assert_eq!(config.hosts[1].idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.pools, 2);
        assert_eq!(config.sink, SinkKind::Files);
    }

    #[test]
    fn host_is_required() {
        CliArgs::try_parse_from(["micro-crawl"]).unwrap_err();
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(parse(&["-H", "ib1", "-a", "0"]), Err(InputError::Config { source: ConfigError::ZeroConcurrency })));
        assert!(matches!(parse(&["-H", "ib1", "-r", "0"]), Err(InputError::Config { source: ConfigError::ZeroRetry })));
        assert!(matches!(parse(&["-H", "bad host"]), Err(InputError::Config { source: ConfigError::InvalidHost { .. } })));
        assert!(matches!(parse(&["-H", "ib1", "-c", "0"]), Err(InputError::Config { source: ConfigError::EmptyPaths })));
        assert!(matches!(parse(&["-H", "ib1", "-t", "0"]), Err(InputError::ZeroPools)));
    }
}
