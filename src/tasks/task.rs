//! # Typed task surface.
//!
//! [`Task`] is the fully typed view of a unit of work: its current [`Status`],
//! a replaying [`StatusStream`], and "ensure started". Every `Task` is also an
//! [`OpaqueTask`], so it can be stored next to tasks of other payload types.
//!
//! Subscribing and starting are separate calls. A subscriber that wants both
//! uses [`Task::subscribe_and_start`], which subscribes first so the `Started`
//! transition is never missed.

use crate::status::Status;
use crate::tasks::{OpaqueTask, StatusStream};

/// Observable, cancelable unit of work producing `Success` or `Error`.
///
/// # Example
/// ```
/// use taskpipe::{MutableTask, Status, Task};
///
/// let task = MutableTask::<u32, String>::from_action(|| 7);
/// let mut stream = task.subscribe_and_start();
///
/// assert_eq!(stream.try_recv(), Some(Status::Idle));
/// assert_eq!(stream.try_recv(), Some(Status::Started));
/// assert_eq!(stream.try_recv(), Some(Status::Success(7)));
/// assert_eq!(stream.try_recv(), None);
/// ```
pub trait Task: OpaqueTask {
    type Success: Clone + Send + Sync + 'static;
    type Error: Clone + Send + Sync + 'static;

    /// Snapshot of the current status.
    fn status(&self) -> Status<Self::Success, Self::Error>;

    /// Stream of statuses, starting with the current one.
    fn subscribe(&self) -> StatusStream<Self::Success, Self::Error>;

    /// Starts the task. A no-op unless it is idle and not launched yet.
    fn start(&self);

    /// Starts the task only if it is still idle.
    fn request_start(&self) {
        if self.status().is_idle() {
            self.start();
        }
    }

    /// Subscribes, then requests a start.
    fn subscribe_and_start(&self) -> StatusStream<Self::Success, Self::Error> {
        let stream = self.subscribe();
        self.request_start();
        stream
    }
}
