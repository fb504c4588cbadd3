//! Error types used by tasks and pipelines.
//!
//! [`TaskError`] covers protocol violations only: driving a finished task,
//! illegal transitions, re-inserting or renaming an attached task, and casting a
//! type-erased handle to the wrong concrete type. A task's own domain failure
//! travels as [`Status::Error`](crate::Status::Error) and cancellation is the
//! [`Status::Canceled`](crate::Status::Canceled) status; neither is a `TaskError`.
//!
//! Every variant provides `as_label` / `as_message` helpers for logging.

use thiserror::Error;

use crate::status::StatusDescription;
use crate::tasks::TaskName;

/// # Protocol violations raised by task and pipeline operations.
///
/// The offending change is never applied; the caller gets the error and a
/// `tracing` diagnostic is emitted at the rejection site.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// A transition was requested after the task reached a terminal status.
    #[error("task {name} already finished as {current}; rejected {attempted}")]
    AlreadyTerminal {
        /// Task name.
        name: TaskName,
        /// Terminal status the task holds.
        current: StatusDescription,
        /// Status that was rejected.
        attempted: StatusDescription,
    },

    /// The transition is not an edge of the state graph (e.g. `idle -> success`).
    #[error("task {name}: illegal transition {from} -> {to}")]
    InvalidTransition {
        /// Task name.
        name: TaskName,
        /// Current status.
        from: StatusDescription,
        /// Rejected status.
        to: StatusDescription,
    },

    /// The task is already tracked by a pipeline.
    #[error("task {name} already belongs to a pipeline")]
    AlreadyInPipeline {
        /// Task name.
        name: TaskName,
    },

    /// The task joined a pipeline and its name is now fixed.
    #[error("task {name} joined a pipeline; its name cannot change")]
    NameLocked {
        /// Current (fixed) name.
        name: TaskName,
    },

    /// A type-erased handle does not wrap the requested concrete task type.
    #[error("task {name} is not a {expected}")]
    TypeMismatch {
        /// Task name.
        name: TaskName,
        /// Requested type.
        expected: &'static str,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpipe::{StatusDescription, TaskError, TaskName};
    ///
    /// let err = TaskError::AlreadyTerminal {
    ///     name: TaskName::from("upload"),
    ///     current: StatusDescription::Canceled,
    ///     attempted: StatusDescription::Success,
    /// };
    /// assert_eq!(err.as_label(), "task_already_terminal");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::AlreadyTerminal { .. } => "task_already_terminal",
            TaskError::InvalidTransition { .. } => "task_invalid_transition",
            TaskError::AlreadyInPipeline { .. } => "task_already_in_pipeline",
            TaskError::NameLocked { .. } => "task_name_locked",
            TaskError::TypeMismatch { .. } => "task_type_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::AlreadyTerminal {
                current, attempted, ..
            } => format!("finished as {current}, got {attempted}"),
            TaskError::InvalidTransition { from, to, .. } => format!("{from} -> {to}"),
            TaskError::AlreadyInPipeline { name } => format!("{name} is already tracked"),
            TaskError::NameLocked { name } => format!("{name} is fixed"),
            TaskError::TypeMismatch { expected, .. } => format!("expected {expected}"),
        }
    }

    /// Name of the task the error refers to.
    pub fn task_name(&self) -> &TaskName {
        match self {
            TaskError::AlreadyTerminal { name, .. }
            | TaskError::InvalidTransition { name, .. }
            | TaskError::AlreadyInPipeline { name }
            | TaskError::NameLocked { name }
            | TaskError::TypeMismatch { name, .. } => name,
        }
    }
}
