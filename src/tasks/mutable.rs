//! # Externally driven task.
//!
//! [`MutableTask`] wraps a body closure and exposes the transitions the body (or
//! anyone holding a handle) uses to drive it: [`start`](MutableTask::start),
//! [`progress`](MutableTask::progress), [`succeed`](MutableTask::succeed),
//! [`fail`](MutableTask::fail) and [`cancel`](MutableTask::cancel).
//!
//! ## Lifecycle
//! ```text
//! start()
//!   ├─ not idle / already launched ─► no-op
//!   ├─ no predecessor ──────────────► Started ─► body(task) ─► token → slot
//!   └─ predecessor gate
//!        ├─ predecessor succeeded ──► run body (synchronously)
//!        ├─ predecessor failed ─────► cancel (synchronously)
//!        └─ still running ──────────► watcher (Tokio task) decides later
//!
//! any terminal transition ─► body token released, own subscriptions released
//! ```
//!
//! ## Rules
//! - The body runs **at most once** and never after a cancel.
//! - A token handed back after the task finished is released on assignment.
//! - Transitions after terminal return [`TaskError::AlreadyTerminal`]; a body
//!   that reports success after being cancelled is expected and harmless.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use futures::stream::{Stream, StreamExt};

use crate::cancel::{Cancellable, CancellableSlot};
use crate::config::Config;
use crate::error::TaskError;
use crate::pipeline::Shared;
use crate::status::{Progress, Status, StatusDescription};
use crate::tasks::machine::StatusMachine;
use crate::tasks::opaque::spawn_watcher;
use crate::tasks::{DescriptionStream, OpaqueTask, Resolver, StatusStream, Task, TaskId, TaskName, TaskRef};

/// Work launched by [`MutableTask::start`]. Returns the handle that stops it.
pub type Body<S, E> = Box<dyn FnOnce(MutableTask<S, E>) -> Cancellable + Send + 'static>;

struct Launch<S, E> {
    body: Option<Body<S, E>>,
    predecessor: Option<TaskRef>,
    /// `start()` already ran the body or armed the gate.
    launched: bool,
}

struct Inner<S, E> {
    machine: StatusMachine<S, E>,
    launch: Mutex<Launch<S, E>>,
    body_token: CancellableSlot,
}

/// Cloneable handle to a task driven from outside.
///
/// # Example
/// ```
/// use taskpipe::{Cancellable, MutableTask, Status};
///
/// let task = MutableTask::<u32, String>::new(|task| {
///     task.progress(None).unwrap();
///     Cancellable::empty()
/// });
/// task.start();
/// assert_eq!(task.status(), Status::Progress(None));
///
/// task.succeed(7).unwrap();
/// assert_eq!(task.status(), Status::Success(7));
/// assert!(task.fail("late".into()).is_err());
/// ```
pub struct MutableTask<S, E> {
    inner: Arc<Inner<S, E>>,
}

impl<S, E> Clone for MutableTask<S, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, E> MutableTask<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an idle task running `body` on start.
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce(MutableTask<S, E>) -> Cancellable + Send + 'static,
    {
        Self::with_config(&Config::default(), body)
    }

    /// Like [`new`](Self::new), sizing the status channel from `config`.
    pub fn with_config<F>(config: &Config, body: F) -> Self
    where
        F: FnOnce(MutableTask<S, E>) -> Cancellable + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                machine: StatusMachine::new(config.status_capacity_clamped()),
                launch: Mutex::new(Launch {
                    body: Some(Box::new(body)),
                    predecessor: None,
                    launched: false,
                }),
                body_token: CancellableSlot::new(),
            }),
        }
    }

    /// Task that succeeds with the value `f` returns.
    pub fn from_action<F>(f: F) -> Self
    where
        F: FnOnce() -> S + Send + 'static,
    {
        Self::new(move |task| {
            let _ = task.succeed(f());
            Cancellable::empty()
        })
    }

    /// Task that resolves with the result `f` returns.
    pub fn from_fallible<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<S, E> + Send + 'static,
    {
        Self::new(move |task| {
            let _ = task.resolve(f());
            Cancellable::empty()
        })
    }

    /// Task resolved through a [`Resolver`] at any later point.
    pub fn from_callback<F>(f: F) -> Self
    where
        F: FnOnce(Resolver<S, E>) + Send + 'static,
    {
        Self::new(move |task| {
            f(Resolver::new(task));
            Cancellable::empty()
        })
    }

    /// Like [`from_callback`](Self::from_callback); the callback returns the
    /// handle that stops its work.
    pub fn from_callback_cancellable<F>(f: F) -> Self
    where
        F: FnOnce(Resolver<S, E>) -> Cancellable + Send + 'static,
    {
        Self::new(move |task| f(Resolver::new(task)))
    }

    /// Task resolved by `fut`, spawned on the current Tokio runtime on start.
    ///
    /// Cancelling the task aborts the future.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<S, E>> + Send + 'static,
    {
        Self::new(move |task| {
            spawn_body(task, move |task| async move {
                let _ = task.resolve(fut.await);
            })
        })
    }

    /// Task resolved by the first item of `stream`; an empty stream cancels it.
    pub fn from_stream<St>(stream: St) -> Self
    where
        St: Stream<Item = Result<S, E>> + Send + 'static,
    {
        Self::new(move |task| {
            spawn_body(task, move |task| async move {
                let mut stream = Box::pin(stream);
                match stream.next().await {
                    Some(result) => {
                        let _ = task.resolve(result);
                    }
                    None => task.cancel(),
                }
            })
        })
    }

    /// Task that resolves with `result` as soon as it starts.
    pub fn just(result: Result<S, E>) -> Self {
        Self::from_fallible(move || result)
    }

    pub fn success(value: S) -> Self {
        Self::just(Ok(value))
    }

    pub fn failure(error: E) -> Self {
        Self::just(Err(error))
    }

    /// Gates the body on `predecessor`: it runs only after the predecessor
    /// succeeded, and the task cancels itself if the predecessor fails.
    pub fn with_predecessor(self, predecessor: TaskRef) -> Self {
        self.inner.launch.lock().predecessor = Some(predecessor);
        self
    }

    /// Type-erased handle to this task.
    pub fn to_ref(&self) -> TaskRef {
        Arc::new(self.clone())
    }

    pub fn id(&self) -> TaskId {
        self.inner.machine.id()
    }

    pub fn name(&self) -> TaskName {
        self.inner.machine.name()
    }

    /// Renames the task; fails with [`TaskError::NameLocked`] once it joined a
    /// pipeline.
    pub fn set_name(&self, name: impl Into<TaskName>) -> Result<(), TaskError> {
        self.inner.machine.set_name(name.into())
    }

    pub fn status(&self) -> Status<S, E> {
        self.inner.machine.status()
    }

    pub fn subscribe(&self) -> StatusStream<S, E> {
        self.inner.machine.subscribe()
    }

    /// Launches the body, or arms the predecessor gate.
    ///
    /// A no-op unless the task is idle and was not launched before.
    pub fn start(&self) {
        let gate = {
            let mut launch = self.inner.launch.lock();
            if launch.launched || !self.inner.machine.status().is_idle() {
                return;
            }
            launch.launched = true;
            launch.predecessor.clone()
        };

        match gate {
            None => self.run_body(),
            Some(predecessor) => self.arm_gate(predecessor),
        }
    }

    pub fn progress(&self, progress: Option<Progress>) -> Result<(), TaskError> {
        self.send(Status::Progress(progress))
    }

    pub fn succeed(&self, value: S) -> Result<(), TaskError> {
        self.send(Status::Success(value))
    }

    pub fn fail(&self, error: E) -> Result<(), TaskError> {
        self.send(Status::Error(error))
    }

    /// [`succeed`](Self::succeed) or [`fail`](Self::fail) depending on `result`.
    pub fn resolve(&self, result: Result<S, E>) -> Result<(), TaskError> {
        self.send(result.into())
    }

    /// Moves the task to `Canceled` unless it already finished. Idempotent.
    pub fn cancel(&self) {
        if self.inner.machine.cancel(&|| self.to_ref()) {
            tracing::debug!(task = %self.name(), "task cancelled");
            self.inner.body_token.cancel();
        }
        let body = self.inner.launch.lock().body.take();
        drop(body);
    }

    /// Calls `f` with every status, starting with the current one.
    ///
    /// The watcher lives until the task finishes. Needs a Tokio runtime.
    pub fn on_status<F>(&self, f: F)
    where
        F: FnMut(Status<S, E>) + Send + 'static,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::error!(task = %self.name(), "on_status needs a Tokio runtime; observer dropped");
            return;
        }
        let token = spawn_watcher(self.subscribe().into_stream(), f);
        self.inner.machine.subscriptions().insert(token.into());
    }

    /// Calls `f` with every status whose description equals `description`.
    pub fn on_status_matching<F>(&self, description: StatusDescription, mut f: F)
    where
        F: FnMut(Status<S, E>) + Send + 'static,
    {
        self.on_status(move |status| {
            if status.description() == description {
                f(status);
            }
        });
    }

    /// Waits for the terminal status.
    pub async fn wait(&self) -> Status<S, E> {
        let mut stream = self.subscribe();
        while let Some(status) = stream.recv().await {
            if status.is_terminal() {
                return status;
            }
        }
        self.status()
    }

    /// Stream of the task's outcome: one `Ok`/`Err` item, or nothing if the
    /// task is cancelled. Ends once the task is terminal.
    pub fn results(&self) -> impl Stream<Item = Result<S, E>> + Send + 'static {
        self.subscribe()
            .into_stream()
            .filter_map(|status| futures::future::ready(status.into_result()))
    }

    pub(crate) fn attach(
        &self,
        pipeline: &Arc<Shared>,
        name: TaskName,
    ) -> Result<Option<TaskRef>, TaskError> {
        self.inner.machine.attach(pipeline, name, &|| self.to_ref())
    }

    fn send(&self, status: Status<S, E>) -> Result<(), TaskError> {
        let terminal = self.inner.machine.send(status, &|| self.to_ref())?;
        if terminal {
            self.inner.body_token.cancel();
        }
        Ok(())
    }

    fn run_body(&self) {
        let Some(body) = self.inner.launch.lock().body.take() else {
            return;
        };
        // Cancelled between start() and here.
        if self.send(Status::Started).is_err() {
            return;
        }
        let token = body(self.clone());
        self.inner.body_token.assign(token);
    }

    fn arm_gate(&self, predecessor: TaskRef) {
        let current = predecessor.status_description();
        if current.is_terminal() {
            self.on_predecessor_finished(current);
            return;
        }

        if tokio::runtime::Handle::try_current().is_err() {
            tracing::error!(
                task = %self.name(),
                predecessor = %predecessor.name(),
                "cannot watch predecessor without a Tokio runtime; cancelling"
            );
            self.cancel();
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let token = spawn_watcher(predecessor.status_descriptions(), move |description| {
            if !description.is_terminal() {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                MutableTask { inner }.on_predecessor_finished(description);
            }
        });
        self.inner.machine.subscriptions().insert(token.into());
    }

    fn on_predecessor_finished(&self, description: StatusDescription) {
        if description == StatusDescription::Success {
            self.run_body();
        } else {
            tracing::debug!(task = %self.name(), predecessor = %description, "predecessor did not succeed; cancelling");
            self.cancel();
        }
    }
}

/// Spawns `work(task)` on the current runtime; cancels the task if there is none.
fn spawn_body<S, E, W, Fut>(task: MutableTask<S, E>, work: W) -> Cancellable
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    W: FnOnce(MutableTask<S, E>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime.spawn(work(task)).into(),
        Err(_) => {
            tracing::error!(task = %task.name(), "future-backed task needs a Tokio runtime; cancelling");
            task.cancel();
            Cancellable::empty()
        }
    }
}

impl<S, E> OpaqueTask for MutableTask<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn id(&self) -> TaskId {
        self.inner.machine.id()
    }

    fn name(&self) -> TaskName {
        self.inner.machine.name()
    }

    fn status_description(&self) -> StatusDescription {
        self.inner.machine.description()
    }

    fn status_descriptions(&self) -> DescriptionStream {
        self.subscribe()
            .into_stream()
            .map(|status| status.description())
            .boxed()
    }

    fn cancel(&self) {
        MutableTask::cancel(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<S, E> Task for MutableTask<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Success = S;
    type Error = E;

    fn status(&self) -> Status<S, E> {
        MutableTask::status(self)
    }

    fn subscribe(&self) -> StatusStream<S, E> {
        MutableTask::subscribe(self)
    }

    fn start(&self) {
        MutableTask::start(self);
    }
}

impl<S, E> fmt::Debug for MutableTask<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableTask")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("status", &self.inner.machine.description())
            .finish()
    }
}
