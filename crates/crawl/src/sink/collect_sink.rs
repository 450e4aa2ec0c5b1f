use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::protocol::{CrawlResult, SinkError};
use crate::sink::ResultSink;

/// Keeps every result in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectSink {
    results: Mutex<Vec<CrawlResult>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CrawlResult>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a copy of the results collected so far.
    pub fn results(&self) -> Vec<CrawlResult> {
        self.lock().clone()
    }

    /// Removes and returns the results collected so far.
    pub fn take(&self) -> Vec<CrawlResult> {
        std::mem::take(&mut *self.lock())
    }
}

impl ResultSink for CollectSink {
    fn accept(&self, result: CrawlResult) -> Result<(), SinkError> {
        self.lock().push(result);
        Ok(())
    }
}
