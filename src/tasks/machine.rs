//! # Status state machine shared by all concrete tasks.
//!
//! [`StatusMachine`] owns the current [`Status`], the status broadcast channel,
//! the task name, the weak pipeline link and the task's own subscriptions. Every
//! transition funnels through [`StatusMachine::send`].
//!
//! ## Critical section
//! ```text
//! send(next)
//!   lock(state)
//!     ├─ terminal?            → Err(AlreadyTerminal)
//!     ├─ not a graph edge?    → Err(InvalidTransition)
//!     ├─ status = next
//!     ├─ broadcast(next)      → subscribers (acceptance order)
//!     └─ pipeline.track(...)  → registry + merged stream
//!   unlock
//!   terminal? → subscriptions.cancel_all()
//! ```
//!
//! ## Rules
//! - Lock order is task → pipeline; nothing here calls user code under the lock.
//! - Subscribing captures the current status and the receiver atomically, so a
//!   subscriber neither misses nor duplicates a transition.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use tokio::sync::broadcast;

use crate::cancel::CancellableSet;
use crate::error::TaskError;
use crate::pipeline::Shared;
use crate::status::{Status, StatusDescription};
use crate::tasks::{StatusStream, TaskId, TaskName, TaskRef};

/// Builds the type-erased handle a pipeline stores for this task.
pub(crate) type HandleFn<'a> = &'a dyn Fn() -> TaskRef;

struct MachineState<S, E> {
    status: Status<S, E>,
    name: TaskName,
    pipeline: Option<Weak<Shared>>,
}

impl<S, E> MachineState<S, E> {
    fn pipeline(&self) -> Option<Arc<Shared>> {
        self.pipeline.as_ref().and_then(Weak::upgrade)
    }
}

pub(crate) struct StatusMachine<S, E> {
    id: TaskId,
    state: Mutex<MachineState<S, E>>,
    tx: broadcast::Sender<Status<S, E>>,
    /// Subscriptions owned by the task; released on terminal.
    subscriptions: CancellableSet,
}

impl<S, E> StatusMachine<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            id: TaskId::next(),
            state: Mutex::new(MachineState {
                status: Status::Idle,
                name: TaskName::unique(),
                pipeline: None,
            }),
            tx,
            subscriptions: CancellableSet::new(),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn name(&self) -> TaskName {
        self.state.lock().name.clone()
    }

    pub(crate) fn status(&self) -> Status<S, E> {
        self.state.lock().status.clone()
    }

    pub(crate) fn description(&self) -> StatusDescription {
        self.state.lock().status.description()
    }

    pub(crate) fn subscriptions(&self) -> &CancellableSet {
        &self.subscriptions
    }

    pub(crate) fn subscribe(&self) -> StatusStream<S, E> {
        let state = self.state.lock();
        let rx = self.tx.subscribe();
        StatusStream::new(state.name.clone(), rx, state.status.clone())
    }

    /// Renames the task. Only allowed before it joins a pipeline.
    pub(crate) fn set_name(&self, name: TaskName) -> Result<(), TaskError> {
        let mut state = self.state.lock();
        if state.pipeline().is_some() {
            tracing::warn!(task = %state.name, requested = %name, "rename after joining a pipeline rejected");
            return Err(TaskError::NameLocked {
                name: state.name.clone(),
            });
        }
        state.name = name;
        Ok(())
    }

    /// Links the task to `pipeline` under `name`.
    ///
    /// If another live task holds `name`, nothing is linked and that occupant
    /// is returned; the caller cancels it once no lock is held and retries.
    pub(crate) fn attach(
        &self,
        pipeline: &Arc<Shared>,
        name: TaskName,
        handle: HandleFn<'_>,
    ) -> Result<Option<TaskRef>, TaskError> {
        let mut state = self.state.lock();
        if state.pipeline().is_some() {
            tracing::warn!(task = %state.name, "task already belongs to a pipeline");
            return Err(TaskError::AlreadyInPipeline {
                name: state.name.clone(),
            });
        }

        if let Err(occupant) = pipeline.admit(self.id, &name, state.status.description(), handle) {
            return Ok(Some(occupant));
        }
        state.name = name;
        state.pipeline = Some(Arc::downgrade(pipeline));
        Ok(None)
    }

    /// Applies `next` if it is a legal transition.
    ///
    /// Returns `Ok(true)` when the accepted status is terminal.
    pub(crate) fn send(&self, next: Status<S, E>, handle: HandleFn<'_>) -> Result<bool, TaskError> {
        let terminal = {
            let mut state = self.state.lock();
            self.check(&state, &next)?;

            let description = next.description();
            state.status = next.clone();
            let _ = self.tx.send(next);

            if let Some(pipeline) = state.pipeline() {
                pipeline.track(self.id, &state.name, description, handle);
            }
            description.is_terminal()
        };

        if terminal {
            self.subscriptions.cancel_all();
        }
        Ok(terminal)
    }

    /// Moves to `Canceled` unless already terminal. Returns whether it did.
    pub(crate) fn cancel(&self, handle: HandleFn<'_>) -> bool {
        if self.status().is_terminal() {
            return false;
        }
        // Lost a race with another terminal transition: still a no-op.
        self.send(Status::Canceled, handle).unwrap_or(false)
    }

    fn check(&self, state: &MachineState<S, E>, next: &Status<S, E>) -> Result<(), TaskError> {
        let current = state.status.description();
        let attempted = next.description();

        if current.is_terminal() {
            if attempted != StatusDescription::Canceled {
                tracing::warn!(task = %state.name, %current, %attempted, "transition after terminal status rejected");
            }
            return Err(TaskError::AlreadyTerminal {
                name: state.name.clone(),
                current,
                attempted,
            });
        }
        if !state.status.can_transition_to(next) {
            tracing::warn!(task = %state.name, from = %current, to = %attempted, "illegal transition rejected");
            return Err(TaskError::InvalidTransition {
                name: state.name.clone(),
                from: current,
                to: attempted,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Machine = StatusMachine<u32, String>;

    fn no_handle() -> TaskRef {
        unreachable!("detached machine never builds a handle")
    }

    #[test]
    fn rejects_after_terminal() {
        let m = Machine::new(8);
        assert_eq!(m.send(Status::Started, &no_handle), Ok(false));
        assert_eq!(m.send(Status::Success(1), &no_handle), Ok(true));

        let err = m.send(Status::Error("late".into()), &no_handle).unwrap_err();
        assert_eq!(err.as_label(), "task_already_terminal");
        assert_eq!(m.status(), Status::Success(1));
    }

    #[test]
    fn rejects_illegal_edge() {
        let m = Machine::new(8);
        let err = m.send(Status::Success(1), &no_handle).unwrap_err();
        assert!(matches!(err, TaskError::InvalidTransition { .. }));
        assert_eq!(m.status(), Status::Idle);
    }

    #[test]
    fn cancel_is_idempotent() {
        let m = Machine::new(8);
        assert!(m.cancel(&no_handle));
        assert!(!m.cancel(&no_handle));
        assert_eq!(m.description(), StatusDescription::Canceled);
    }

    #[test]
    fn terminal_releases_subscriptions() {
        let m = Machine::new(8);
        let token = tokio_util::sync::CancellationToken::new();
        assert!(m.subscriptions().insert(token.clone().into()));

        m.send(Status::Started, &no_handle).unwrap();
        assert!(!token.is_cancelled());
        m.send(Status::Canceled, &no_handle).unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn late_subscriber_sees_terminal_once() {
        let m = Machine::new(8);
        m.send(Status::Started, &no_handle).unwrap();
        m.send(Status::Error("boom".into()), &no_handle).unwrap();

        let mut stream = m.subscribe();
        assert_eq!(stream.try_recv(), Some(Status::Error("boom".into())));
        assert_eq!(stream.try_recv(), None);
        assert!(stream.is_done());
    }

    #[test]
    fn subscriber_sees_transitions_in_order() {
        let m = Machine::new(8);
        let mut stream = m.subscribe();
        m.send(Status::Started, &no_handle).unwrap();
        m.send(Status::Progress(None), &no_handle).unwrap();
        m.send(Status::Success(3), &no_handle).unwrap();
        let _ = m.send(Status::Success(4), &no_handle);

        let seen: Vec<_> = std::iter::from_fn(|| stream.try_recv()).collect();
        assert_eq!(
            seen,
            vec![
                Status::Idle,
                Status::Started,
                Status::Progress(None),
                Status::Success(3)
            ]
        );
    }
}
