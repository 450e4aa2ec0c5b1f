use std::sync::Arc;
use std::time::Duration;

use crate::protocol::ConfigError;

/// Settings of one [`CrawlerPool`](crate::pool::CrawlerPool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    host: Arc<str>,
    port: u16,
    concurrency: usize,
    retry: u32,
    retry_delay: Duration,
    max_attempts: u32,
    idle_timeout: Option<Duration>,
    read_buffer: usize,
}

impl PoolConfig {
    pub const DEFAULT_PORT: u16 = 80;
    pub const DEFAULT_CONCURRENCY: usize = 4;
    pub const DEFAULT_RETRY: u32 = 7;
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_READ_BUFFER: usize = 8 * 1024;

    pub fn new<H: AsRef<str>>(host: H) -> Self {
        Self {
            host: Arc::from(host.as_ref()),
            port: Self::DEFAULT_PORT,
            concurrency: Self::DEFAULT_CONCURRENCY,
            retry: Self::DEFAULT_RETRY,
            retry_delay: Duration::ZERO,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            idle_timeout: None,
            read_buffer: Self::DEFAULT_READ_BUFFER,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Maximum number of live connections per batch.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Number of probe attempts before the host is considered unreachable.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Pause between two failed probe attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Number of deliveries of one path before it is abandoned.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Fails a run when no connection makes progress for this long.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_read_buffer(mut self, read_buffer: usize) -> Self {
        self.read_buffer = read_buffer;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn shared_host(&self) -> Arc<str> {
        Arc::clone(&self.host)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn retry(&self) -> u32 {
        self.retry
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    pub fn read_buffer(&self) -> usize {
        self.read_buffer
    }

    /// Checks everything that can be checked before touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::invalid_host(&*self.host, "empty host"));
        }
        if let Some(c) = self.host.chars().find(|c| c.is_whitespace() || c.is_control() || *c == '/') {
            return Err(ConfigError::invalid_host(&*self.host, format!("contains {c:?}")));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.retry == 0 {
            return Err(ConfigError::ZeroRetry);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PoolConfig::new("upload.wikimedia.org");
        assert_eq!(config.host(), "upload.wikimedia.org");
        assert_eq!(config.port(), 80);
        assert_eq!(config.concurrency(), 4);
        assert_eq!(config.retry(), 7);
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.read_buffer(), 8 * 1024);
        config.validate().unwrap();
    }

    #[test]
    fn setters_override_defaults() {
        let config = PoolConfig::new("ib1")
            .with_port(8080)
            .with_concurrency(10)
            .with_retry(2)
            .with_retry_delay(Duration::from_millis(250))
            .with_max_attempts(5)
            .with_idle_timeout(Some(Duration::from_secs(30)))
            .with_read_buffer(512);

        assert_eq!((config.port(), config.concurrency(), config.retry(), config.max_attempts()), (8080, 10, 2, 5));
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.read_buffer(), 512);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(PoolConfig::new("").validate(), Err(ConfigError::InvalidHost { .. })));
        assert!(matches!(PoolConfig::new("a host").validate(), Err(ConfigError::InvalidHost { .. })));
        assert!(matches!(PoolConfig::new("http://a").validate(), Err(ConfigError::InvalidHost { .. })));
        assert!(matches!(PoolConfig::new("a").with_concurrency(0).validate(), Err(ConfigError::ZeroConcurrency)));
        assert!(matches!(PoolConfig::new("a").with_retry(0).validate(), Err(ConfigError::ZeroRetry)));
        assert!(matches!(PoolConfig::new("a").with_max_attempts(0).validate(), Err(ConfigError::ZeroAttempts)));
    }
}
