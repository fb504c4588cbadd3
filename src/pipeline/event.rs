//! # Pipeline events.
//!
//! A [`TaskEvent`] is published on the pipeline bus for every accepted
//! transition of every tracked task.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Events of one task are published inside that task's critical
//! section, so per-task order on the bus equals acceptance order.
//!
//! ## Example
//! ```rust
//! use taskpipe::{StatusDescription, TaskEvent, TaskId, TaskName};
//!
//! # fn demo(id: TaskId) {
//! let ev = TaskEvent::new(id, TaskName::from("sync"), StatusDescription::Started);
//! assert_eq!(ev.name.as_str(), "sync");
//! assert!(!ev.is_terminal());
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::status::StatusDescription;
use crate::tasks::{TaskId, TaskName};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// `(name, status)` pair observed by a pipeline.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Identity of the task instance.
    pub id: TaskId,
    /// Name the task is tracked under.
    pub name: TaskName,
    /// Accepted status.
    pub status: StatusDescription,
}

impl TaskEvent {
    /// Creates an event with the current timestamp and the next sequence number.
    pub fn new(id: TaskId, name: TaskName, status: StatusDescription) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            id,
            name,
            status,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_increases() {
        let id = TaskId::next();
        let a = TaskEvent::new(id, "a".into(), StatusDescription::Started);
        let b = TaskEvent::new(id, "a".into(), StatusDescription::Success);
        assert!(a.seq < b.seq);
        assert!(b.is_terminal());
    }
}
