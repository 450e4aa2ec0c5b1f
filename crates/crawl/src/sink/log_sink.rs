use tracing::{debug, info};

use crate::protocol::{CrawlResult, SinkError};
use crate::sink::ResultSink;

/// Logs one line per result: status, reason, body length, time and path.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    verbose: bool,
}

impl LogSink {
    /// Logs results at `info`.
    pub fn new() -> Self {
        Self { verbose: true }
    }

    /// Logs results at `debug`, so they only show up when asked for.
    pub fn quiet() -> Self {
        Self { verbose: false }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for LogSink {
    fn accept(&self, result: CrawlResult) -> Result<(), SinkError> {
        let status = result.status.as_u16();
        let elapsed_ms = result.elapsed.as_secs_f64() * 1000.0;

        if self.verbose {
            info!(status, reason = result.reason(), bytes = result.body.len(), elapsed_ms, path = %result.path, "fetched");
        } else {
            debug!(status, reason = result.reason(), bytes = result.body.len(), elapsed_ms, path = %result.path, "fetched");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::result;

    #[test]
    fn never_fails() {
        LogSink::new().accept(result("/a", 200, b"hello")).unwrap();
        LogSink::quiet().accept(result("/b", 404, b"")).unwrap();
    }
}
