//! # Per-subscriber status stream.
//!
//! [`StatusStream`] is handed out by [`Task::subscribe`](crate::Task::subscribe).
//!
//! ## Rules
//! - The **first** item is the status current at subscription time, so a
//!   subscriber that arrives after the task finished still sees the terminal
//!   status, exactly once.
//! - Every later accepted transition follows, in acceptance order.
//! - The stream **completes** right after yielding a terminal status, or when
//!   the task is dropped.
//! - A receiver that lags skips the oldest transitions (logged); the terminal
//!   status is always the newest one and is never skipped.

use futures::Stream;
use futures::stream;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::status::Status;
use crate::tasks::TaskName;

/// Multicast, replay-current stream of a task's statuses.
pub struct StatusStream<S, E> {
    name: TaskName,
    rx: broadcast::Receiver<Status<S, E>>,
    /// Status captured at subscription time, not yet yielded.
    pending: Option<Status<S, E>>,
    done: bool,
}

impl<S, E> StatusStream<S, E>
where
    S: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(crate) fn new(
        name: TaskName,
        rx: broadcast::Receiver<Status<S, E>>,
        current: Status<S, E>,
    ) -> Self {
        Self {
            name,
            rx,
            pending: Some(current),
            done: false,
        }
    }

    /// Waits for the next status. Returns `None` once the stream completed.
    pub async fn recv(&mut self) -> Option<Status<S, E>> {
        if let Some(status) = self.take_pending() {
            return Some(status);
        }

        while !self.done {
            match self.rx.recv().await {
                Ok(status) => return Some(self.observe(status)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(task = %self.name, skipped, "status subscriber lagged");
                }
                Err(RecvError::Closed) => self.done = true,
            }
        }
        None
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    ///
    /// Returns `None` when nothing is buffered right now or the stream completed.
    pub fn try_recv(&mut self) -> Option<Status<S, E>> {
        if let Some(status) = self.take_pending() {
            return Some(status);
        }

        while !self.done {
            match self.rx.try_recv() {
                Ok(status) => return Some(self.observe(status)),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(task = %self.name, skipped, "status subscriber lagged");
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => self.done = true,
            }
        }
        None
    }

    /// Returns `true` once a terminal status was yielded or the task is gone.
    pub fn is_done(&self) -> bool {
        self.done && self.pending.is_none()
    }

    /// Converts into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Status<S, E>> + Send + 'static {
        stream::unfold(self, |mut s| async move { s.recv().await.map(|status| (status, s)) })
    }

    fn take_pending(&mut self) -> Option<Status<S, E>> {
        let status = self.pending.take()?;
        Some(self.observe(status))
    }

    fn observe(&mut self, status: Status<S, E>) -> Status<S, E> {
        if status.is_terminal() {
            self.done = true;
        }
        status
    }
}
