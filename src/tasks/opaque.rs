//! # Type-erased task handle.
//!
//! [`OpaqueTask`] is the narrow surface every task exposes regardless of its
//! payload types: identity, coarse status, a stream of coarse statuses and
//! `cancel()`. Pipelines store tasks as [`TaskRef`] (`Arc<dyn OpaqueTask>`).
//!
//! ## Rules
//! - The only way back to a concrete task is [`downcast`], which fails with
//!   [`TaskError::TypeMismatch`] instead of panicking.
//! - Combinators from [`OpaqueTaskExt`] spawn a watcher on the current Tokio
//!   runtime and return a [`Cancellable`] guard; dropping the guard stops the
//!   watcher. Call [`Cancellable::detach`] on the guard to keep the callback
//!   for the task's whole life instead: the watcher then ends on its own once
//!   the task is terminal or every handle to it is dropped.
//!
//! ## Example
//! ```
//! use taskpipe::{downcast, MutableTask, OpaqueTask, Pipeline, StatusDescription};
//!
//! let pipeline = Pipeline::default();
//! let task = MutableTask::<u32, String>::new(|_task| Default::default());
//! pipeline.insert(&task, "sync").unwrap();
//! task.start();
//!
//! let found = pipeline.lookup("sync").unwrap();
//! assert_eq!(found.status_description(), StatusDescription::Started);
//!
//! let typed = downcast::<u32, String>(&found).unwrap();
//! typed.succeed(42).unwrap();
//! assert!(downcast::<String, String>(&found).is_err());
//! ```

use std::any::{Any, type_name};
use std::sync::Arc;

use futures::stream::{BoxStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::cancel::Cancellable;
use crate::error::TaskError;
use crate::status::StatusDescription;
use crate::tasks::{MutableTask, TaskId, TaskName};

/// Shared, type-erased task handle.
pub type TaskRef = Arc<dyn OpaqueTask>;

/// Boxed stream of coarse statuses.
pub type DescriptionStream = BoxStream<'static, StatusDescription>;

/// Payload-free view of a task.
pub trait OpaqueTask: Send + Sync + 'static {
    /// Process-unique identity.
    fn id(&self) -> TaskId;

    /// Current logical name.
    fn name(&self) -> TaskName;

    /// Coarse projection of the current status.
    fn status_description(&self) -> StatusDescription;

    /// Coarse statuses, starting with the current one; completes after terminal.
    fn status_descriptions(&self) -> DescriptionStream;

    /// Moves the task to `Canceled` unless it is already terminal.
    fn cancel(&self);

    /// Hook for [`downcast`].
    fn as_any(&self) -> &dyn Any;
}

/// Recovers the concrete [`MutableTask`] behind a [`TaskRef`].
pub fn downcast<S, E>(task: &TaskRef) -> Result<MutableTask<S, E>, TaskError>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    task.as_any()
        .downcast_ref::<MutableTask<S, E>>()
        .cloned()
        .ok_or_else(|| TaskError::TypeMismatch {
            name: task.name(),
            expected: type_name::<MutableTask<S, E>>(),
        })
}

/// Status-driven callbacks available on every [`OpaqueTask`].
///
/// Each method returns the watcher's guard. Hold it to scope the callback,
/// or [`detach`](Cancellable::detach) it to fire-and-forget:
/// ```
/// use taskpipe::{MutableTask, OpaqueTaskExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let task = MutableTask::<u32, String>::new(|_| Default::default());
/// task.to_ref().on_success(|| println!("done")).detach();
/// task.start();
/// task.succeed(1).unwrap();
/// # }
/// ```
pub trait OpaqueTaskExt: OpaqueTask {
    /// Calls `f` for every status that carries output (started, progress, success).
    fn on_output<F>(&self, f: F) -> Cancellable
    where
        F: FnMut(StatusDescription) + Send + 'static,
    {
        self.on_status_where(|d| d.is_output(), f)
    }

    /// Calls `f` once if the task succeeds.
    fn on_success<F>(&self, f: F) -> Cancellable
    where
        F: FnOnce() + Send + 'static,
    {
        let mut f = Some(f);
        self.on_status_where(
            |d| d == StatusDescription::Success,
            move |_| {
                if let Some(f) = f.take() {
                    f();
                }
            },
        )
    }

    /// Calls `f` once if the task fails or is cancelled.
    fn on_failure<F>(&self, f: F) -> Cancellable
    where
        F: FnOnce(StatusDescription) + Send + 'static,
    {
        let mut f = Some(f);
        self.on_status_where(|d| d.is_failure(), move |d| {
            if let Some(f) = f.take() {
                f(d);
            }
        })
    }

    /// Calls `f` for every status.
    fn on_status<F>(&self, f: F) -> Cancellable
    where
        F: FnMut(StatusDescription) + Send + 'static,
    {
        self.on_status_where(|_| true, f)
    }

    /// Calls `f` for every status accepted by `filter`.
    ///
    /// Dropping the returned guard stops the watcher; a detached guard leaves
    /// it running until the task is terminal or dropped.
    fn on_status_where<P, F>(&self, filter: P, mut f: F) -> Cancellable
    where
        P: Fn(StatusDescription) -> bool + Send + 'static,
        F: FnMut(StatusDescription) + Send + 'static,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::error!(task = %self.name(), "status watcher needs a Tokio runtime; callback dropped");
            return Cancellable::empty();
        }
        let token = spawn_watcher(self.status_descriptions(), move |d| {
            if filter(d) {
                f(d);
            }
        });
        token.into()
    }
}

impl<T: OpaqueTask + ?Sized> OpaqueTaskExt for T {}

/// Drives `f` with every item of `stream` on a Tokio task until the stream
/// ends or the returned token is cancelled.
///
/// Buffered items win over cancellation, so a terminal status that was already
/// published is still delivered.
pub(crate) fn spawn_watcher<St, F>(stream: St, mut f: F) -> CancellationToken
where
    St: Stream + Send + 'static,
    St::Item: Send,
    F: FnMut(St::Item) + Send + 'static,
{
    let token = CancellationToken::new();
    let stop = token.clone();

    tokio::spawn(async move {
        let mut stream = Box::pin(stream);
        loop {
            tokio::select! {
                biased;
                next = stream.next() => match next {
                    Some(item) => f(item),
                    None => break,
                },
                _ = stop.cancelled() => break,
            }
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn handle(task: &MutableTask<u32, String>) -> TaskRef {
        Arc::new(task.clone())
    }

    #[tokio::test]
    async fn on_success_fires_once() {
        let task = MutableTask::<u32, String>::new(|_| Cancellable::empty());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _guard = handle(&task).on_success(move || {
            let _ = tx.send(());
        });

        task.start();
        task.succeed(1).unwrap();

        assert_eq!(rx.recv().await, Some(()));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn on_failure_reports_cancel() {
        let task = MutableTask::<u32, String>::new(|_| Cancellable::empty());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _guard = handle(&task).on_failure(move |d| {
            let _ = tx.send(d);
        });

        task.cancel();
        assert_eq!(rx.recv().await, Some(StatusDescription::Canceled));
    }

    #[tokio::test]
    async fn on_output_skips_idle() {
        let task = MutableTask::<u32, String>::new(|_| Cancellable::empty());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _guard = handle(&task).on_output(move |d| {
            let _ = tx.send(d);
        });

        task.start();
        task.progress(None).unwrap();
        task.succeed(3).unwrap();

        assert_eq!(rx.recv().await, Some(StatusDescription::Started));
        assert_eq!(rx.recv().await, Some(StatusDescription::Progress));
        assert_eq!(rx.recv().await, Some(StatusDescription::Success));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_guard_stops_watcher() {
        let task = MutableTask::<u32, String>::new(|_| Cancellable::empty());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let guard = handle(&task).on_status(move |d| {
            let _ = tx.send(d);
        });

        assert_eq!(rx.recv().await, Some(StatusDescription::Idle));
        drop(guard);

        // Watcher exit drops the sender.
        let closed = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(closed, Ok(None));
        task.start();
    }

    #[tokio::test]
    async fn detached_guard_still_fires() {
        let task = MutableTask::<u32, String>::new(|_| Cancellable::empty());
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle(&task)
            .on_success(move || {
                let _ = tx.send(());
            })
            .detach();

        task.start();
        task.succeed(1).unwrap();
        assert_eq!(rx.recv().await, Some(()));
    }

    #[tokio::test]
    async fn detached_watcher_ends_with_dropped_task() {
        let task = MutableTask::<u32, String>::new(|_| Cancellable::empty());
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle(&task)
            .on_status(move |d| {
                let _ = tx.send(d);
            })
            .detach();

        assert_eq!(rx.recv().await, Some(StatusDescription::Idle));
        drop(task);

        let closed = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(closed, Ok(None));
    }

    #[test]
    fn downcast_rejects_other_payloads() {
        let task = MutableTask::<u32, String>::new(|_| Cancellable::empty());
        task.set_name("typed").unwrap();

        let erased = handle(&task);
        assert_eq!(downcast::<u32, String>(&erased).map(|t| t.id()), Ok(task.id()));

        let err = downcast::<u64, String>(&erased).unwrap_err();
        assert_eq!(err.as_label(), "task_type_mismatch");
        assert_eq!(err.task_name().as_str(), "typed");
    }
}
