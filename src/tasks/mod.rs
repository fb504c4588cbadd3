//! # Tasks: observable, cancelable state machines.
//!
//! This module provides the task-related types:
//! - [`Task`] - typed status surface (status, subscribe, start)
//! - [`OpaqueTask`] / [`TaskRef`] - payload-free handle used by pipelines
//! - [`MutableTask`] - task driven by its body or any handle holder
//! - [`ParametrizedTask`] - `MutableTask` with an input parameter slot
//! - [`StatusStream`] - per-subscriber stream replaying the current status
//!
//! ## Architecture
//! ```text
//! MutableTask ──owns──► StatusMachine ──broadcast──► StatusStream (per subscriber)
//!      │                     │
//!      │ body(task)          └──track (weak link)──► Pipeline
//!      ▼
//!  Cancellable ──► CancellableSlot (released on terminal)
//! ```

mod machine;
mod mutable;
mod name;
mod opaque;
mod parametrized;
mod resolver;
mod stream;
mod task;

pub use mutable::{Body, MutableTask};
pub use name::{TaskId, TaskName};
pub use opaque::{DescriptionStream, OpaqueTask, OpaqueTaskExt, TaskRef, downcast};
pub use parametrized::ParametrizedTask;
pub use resolver::Resolver;
pub use stream::StatusStream;
pub use task::Task;

pub(crate) use machine::HandleFn;
pub(crate) use opaque::spawn_watcher;
