//! Work distribution for crawler pools.
//!
//! [`WorkQueue`] is the only state shared between connections. Connections pop one
//! [`WorkItem`] per request; pools hand back the items of aborted requests after each
//! batch, and give up on an item once it used up its attempts.

mod work_queue;

pub use work_queue::QueueClosed;
pub use work_queue::Requeue;
pub use work_queue::WorkItem;
pub use work_queue::WorkQueue;
