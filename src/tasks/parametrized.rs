//! # Task with an input parameter.
//!
//! [`ParametrizedTask`] is a [`MutableTask`] whose body reads a parameter slot.
//! The parameter can be given up front ([`with_parameter`](ParametrizedTask::with_parameter))
//! or delivered later ([`receive`](ParametrizedTask::receive)), e.g. by a
//! predecessor's output, before the task starts.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cancel::Cancellable;
use crate::status::{Status, StatusDescription};
use crate::tasks::{DescriptionStream, MutableTask, OpaqueTask, StatusStream, Task, TaskId, TaskName};

/// [`MutableTask`] plus a parameter slot its body can read.
///
/// # Example
/// ```
/// use taskpipe::{Cancellable, ParametrizedTask, Status};
///
/// let task = ParametrizedTask::<u32, u32, String>::new(|task| {
///     let doubled = task.with_parameter_ref(|p| p * 2).unwrap_or_default();
///     let _ = task.succeed(doubled);
///     Cancellable::empty()
/// });
///
/// task.receive(21);
/// task.start();
/// assert_eq!(task.status(), Status::Success(42));
/// ```
pub struct ParametrizedTask<P, S, E> {
    task: MutableTask<S, E>,
    parameter: Arc<Mutex<Option<P>>>,
}

impl<P, S, E> Clone for ParametrizedTask<P, S, E> {
    fn clone(&self) -> Self {
        Self {
            task: self.task.clone(),
            parameter: Arc::clone(&self.parameter),
        }
    }
}

impl<P, S, E> ParametrizedTask<P, S, E>
where
    P: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an idle task; `body` receives this task (parameter included).
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce(ParametrizedTask<P, S, E>) -> Cancellable + Send + 'static,
    {
        let parameter = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&parameter);
        let task = MutableTask::new(move |task| {
            body(ParametrizedTask {
                task,
                parameter: slot,
            })
        });
        Self { task, parameter }
    }

    /// Sets the parameter at construction time.
    pub fn with_parameter(self, parameter: P) -> Self {
        self.receive(parameter);
        self
    }

    /// Stores (or replaces) the parameter.
    pub fn receive(&self, parameter: P) {
        *self.parameter.lock() = Some(parameter);
    }

    /// Runs `f` on the parameter; logs a warning and returns `None` if unset.
    pub fn with_parameter_ref<R>(&self, f: impl FnOnce(&P) -> R) -> Option<R> {
        let guard = self.parameter.lock();
        match guard.as_ref() {
            Some(parameter) => Some(f(parameter)),
            None => {
                tracing::warn!(task = %self.task.name(), "task parameter read before it was set");
                None
            }
        }
    }

    /// Underlying task handle.
    pub fn as_task(&self) -> &MutableTask<S, E> {
        &self.task
    }
}

impl<P, S, E> ParametrizedTask<P, S, E>
where
    P: Clone + Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Clone of the current parameter.
    pub fn parameter(&self) -> Option<P> {
        self.parameter.lock().clone()
    }
}

impl<P, S, E> Deref for ParametrizedTask<P, S, E> {
    type Target = MutableTask<S, E>;

    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

impl<P, S, E> OpaqueTask for ParametrizedTask<P, S, E>
where
    P: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn id(&self) -> TaskId {
        self.task.id()
    }

    fn name(&self) -> TaskName {
        self.task.name()
    }

    fn status_description(&self) -> StatusDescription {
        OpaqueTask::status_description(&self.task)
    }

    fn status_descriptions(&self) -> DescriptionStream {
        self.task.status_descriptions()
    }

    fn cancel(&self) {
        self.task.cancel();
    }

    fn as_any(&self) -> &dyn Any {
        self.task.as_any()
    }
}

impl<P, S, E> Task for ParametrizedTask<P, S, E>
where
    P: Send + 'static,
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Success = S;
    type Error = E;

    fn status(&self) -> Status<S, E> {
        self.task.status()
    }

    fn subscribe(&self) -> StatusStream<S, E> {
        self.task.subscribe()
    }

    fn start(&self) {
        self.task.start();
    }
}

impl<P, S, E> fmt::Debug for ParametrizedTask<P, S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParametrizedTask")
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::downcast;

    type T = ParametrizedTask<String, usize, String>;

    fn measuring() -> T {
        T::new(|task| {
            match task.with_parameter_ref(String::len) {
                Some(len) => task.succeed(len),
                None => task.fail("no input".into()),
            }
            .ok();
            Cancellable::empty()
        })
    }

    #[test]
    fn parameter_given_up_front() {
        let task = measuring().with_parameter("four".into());
        assert_eq!(task.parameter().as_deref(), Some("four"));

        task.start();
        assert_eq!(task.status(), Status::Success(4));
    }

    #[test]
    fn missing_parameter_is_reported_by_body() {
        let task = measuring();
        task.start();
        assert_eq!(task.status(), Status::Error("no input".into()));
    }

    #[test]
    fn panicking_reader_leaves_parameter_usable() {
        let task = measuring().with_parameter("abc".into());
        let reader = task.clone();

        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            reader.with_parameter_ref(|_| -> usize { panic!("reader failed") })
        }));
        assert!(caught.is_err());

        assert_eq!(task.parameter().as_deref(), Some("abc"));
        task.start();
        assert_eq!(task.status(), Status::Success(3));
    }

    #[test]
    fn erased_handle_downcasts_to_inner_task() {
        let task = measuring();
        let erased: crate::tasks::TaskRef = Arc::new(task.clone());

        let inner = downcast::<usize, String>(&erased).unwrap();
        assert_eq!(inner.id(), task.id());
    }
}
