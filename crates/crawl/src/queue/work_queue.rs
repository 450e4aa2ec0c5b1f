use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::protocol::CrawlPath;

/// A path waiting to be crawled, together with the number of times it was handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    path: CrawlPath,
    attempts: u32,
}

impl WorkItem {
    pub fn new(path: CrawlPath) -> Self {
        Self { path, attempts: 0 }
    }

    pub fn path(&self) -> &CrawlPath {
        &self.path
    }

    /// Number of times this item was dequeued, including the current delivery.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn into_path(self) -> CrawlPath {
        self.path
    }
}

/// Outcome of handing an aborted item back to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// The item is pending again
    Requeued,
    /// The item used up its attempts and was dropped
    Abandoned,
}

/// Returned by [`WorkQueue::enqueue`] after the queue was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueClosed(pub CrawlPath);

/// A FIFO of pending paths shared by every connection of every pool.
///
/// All operations take a short lock and never wait for work: an empty queue simply
/// returns `None`. Closing the queue rejects new paths from producers but still lets
/// the crawler hand back paths whose request was aborted.
#[derive(Debug, Default)]
pub struct WorkQueue {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    items: VecDeque<WorkItem>,
    closed: bool,
    abandoned: Vec<CrawlPath>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an open queue holding `paths` in order.
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = CrawlPath>,
    {
        let items = paths.into_iter().map(WorkItem::new).collect();
        Self { inner: Mutex::new(Inner { items, closed: false, abandoned: Vec::new() }) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // the queue holds no invariant a panicking holder could break half way
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a path, failing once the queue is closed.
    pub fn enqueue(&self, path: CrawlPath) -> Result<(), QueueClosed> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(QueueClosed(path));
        }
        inner.items.push_back(WorkItem::new(path));
        Ok(())
    }

    /// Pops the next item without blocking and counts the delivery.
    pub fn try_dequeue(&self) -> Option<WorkItem> {
        let mut item = self.lock().items.pop_front()?;
        item.attempts += 1;
        Some(item)
    }

    /// Hands back an item whose request was aborted.
    ///
    /// Items that were already delivered `max_attempts` times are abandoned instead.
    pub fn requeue(&self, item: WorkItem, max_attempts: u32) -> Requeue {
        let mut inner = self.lock();
        if item.attempts >= max_attempts {
            warn!(path = %item.path, attempts = item.attempts, "giving up on path");
            inner.abandoned.push(item.path);
            return Requeue::Abandoned;
        }

        debug!(path = %item.path, attempts = item.attempts, "requeue aborted path");
        inner.items.push_back(item);
        Requeue::Requeued
    }

    /// Signals that no more paths will arrive.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Paths dropped after exhausting their attempts, in the order they were given up.
    pub fn abandoned(&self) -> Vec<CrawlPath> {
        self.lock().abandoned.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn path(s: &str) -> CrawlPath {
        CrawlPath::new(s).unwrap()
    }

    #[test]
    fn fifo_order() {
        let queue = WorkQueue::from_paths([path("/a"), path("/b")]);
        queue.enqueue(path("/c")).unwrap();

        let order: Vec<_> = std::iter::from_fn(|| queue.try_dequeue()).map(|item| item.into_path().to_string()).collect();
        assert_eq!(order, ["/a", "/b", "/c"]);
    }

    #[test]
    fn empty_open_queue_returns_none() {
        let queue = WorkQueue::new();
        assert!(queue.try_dequeue().is_none());
        assert!(!queue.is_closed());
        assert!(queue.is_empty());
    }

    #[test]
    fn closed_queue_rejects_enqueue_and_drains() {
        let queue = WorkQueue::from_paths([path("/a")]);
        queue.close();

        assert_eq!(queue.enqueue(path("/b")), Err(QueueClosed(path("/b"))));
        assert!(!queue.is_empty());
        assert!(queue.try_dequeue().is_some());
        assert!(queue.is_empty());
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn requeue_counts_attempts_until_abandoned() {
        let queue = WorkQueue::from_paths([path("/flaky")]);
        queue.close();

        let item = queue.try_dequeue().unwrap();
        assert_eq!(item.attempts(), 1);
        assert_eq!(queue.requeue(item, 2), Requeue::Requeued);

        let item = queue.try_dequeue().unwrap();
        assert_eq!(item.attempts(), 2);
        assert_eq!(queue.requeue(item, 2), Requeue::Abandoned);

        assert!(queue.is_empty());
        assert_eq!(queue.abandoned(), vec![path("/flaky")]);
    }

    #[test]
    fn concurrent_consumers_see_every_path_once() {
        let queue = Arc::new(WorkQueue::from_paths((0..1000).map(|i| path(&format!("/{i}")))));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || std::iter::from_fn(|| queue.try_dequeue()).count())
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 1000);
    }
}
