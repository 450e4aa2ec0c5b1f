use std::fmt;
use std::ops::AddAssign;

/// Counters of one finished [`CrawlerPool::run`](crate::pool::CrawlerPool::run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: u64,
    /// Connections that were opened successfully
    pub connections: u64,
    /// Results handed to the sink
    pub completed: u64,
    pub requeued: u64,
    /// Paths given up after too many attempts
    pub abandoned: u64,
    pub terminated: bool,
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, other: Self) {
        self.batches += other.batches;
        self.connections += other.connections;
        self.completed += other.completed;
        self.requeued += other.requeued;
        self.abandoned += other.abandoned;
        self.terminated |= other.terminated;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} requeued, {} abandoned in {} batches over {} connections",
            self.completed, self.requeued, self.abandoned, self.batches, self.connections
        )?;
        if self.terminated {
            f.write_str(" (terminated)")?;
        }
        Ok(())
    }
}
