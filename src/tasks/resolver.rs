//! Completion handle passed to callback-style task bodies.

use std::fmt;

use crate::error::TaskError;
use crate::status::Progress;
use crate::tasks::MutableTask;

/// Drives the task a callback body belongs to.
///
/// Every method funnels through the task's transition gate, so a resolver that
/// fires after the task was cancelled gets [`TaskError::AlreadyTerminal`] and
/// changes nothing.
pub struct Resolver<S, E> {
    task: MutableTask<S, E>,
}

impl<S, E> Resolver<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(task: MutableTask<S, E>) -> Self {
        Self { task }
    }

    pub fn progress(&self, progress: Option<Progress>) -> Result<(), TaskError> {
        self.task.progress(progress)
    }

    pub fn succeed(&self, value: S) -> Result<(), TaskError> {
        self.task.succeed(value)
    }

    pub fn fail(&self, error: E) -> Result<(), TaskError> {
        self.task.fail(error)
    }

    pub fn resolve(&self, result: Result<S, E>) -> Result<(), TaskError> {
        self.task.resolve(result)
    }

    /// Returns `true` once the task reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.task.status().is_terminal()
    }
}

impl<S, E> Clone for Resolver<S, E> {
    fn clone(&self) -> Self {
        Self {
            task: self.task.clone(),
        }
    }
}

impl<S, E> fmt::Debug for Resolver<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("task", &self.task).finish()
    }
}
