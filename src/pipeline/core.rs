//! # Pipeline: name-keyed registry of tasks.
//!
//! A [`Pipeline`] tracks tasks by logical name while they are live and keeps a
//! bounded history of their terminal statuses afterwards. Every transition of
//! every tracked task is re-published as a [`TaskEvent`] on the pipeline bus.
//!
//! ## Architecture
//! ```text
//! MutableTask::send(status)
//!   lock(task)
//!     └─► Shared::track(id, name, status)
//!           lock(registry)
//!             ├─ Registry::apply()      live map + history ring
//!             ├─ Bus::publish(event)    → subscribe() / spawn_subscriber()
//!             └─ revision += 1          → changes()
//!           unlock
//!   unlock
//! ```
//!
//! ## Rules
//! - Lock order is task → pipeline. The registry lock never calls into a task;
//!   cancellations (eviction, `cancel`, `cancel_all`) run after it is released.
//! - Tasks hold a `Weak` link; dropping the pipeline silently stops tracking.
//! - Reinserting a name cancels the live occupant before the newcomer joins.
//! - A child pipeline knows its parent but nothing is forwarded to it.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::bus::Bus;
use super::event::TaskEvent;
use super::registry::Registry;
use crate::cancel::Cancellable;
use crate::config::Config;
use crate::error::TaskError;
use crate::status::StatusDescription;
use crate::subscribers::Subscribe;
use crate::tasks::{HandleFn, MutableTask, TaskId, TaskName, TaskRef};

/// State shared by all clones of a [`Pipeline`]; tasks link to it weakly.
pub(crate) struct Shared {
    config: Config,
    parent: Option<Weak<Shared>>,
    registry: Mutex<Registry>,
    bus: Bus,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn new(config: Config, parent: Option<Weak<Shared>>) -> Self {
        let (revision, _rx) = watch::channel(0);
        Self {
            registry: Mutex::new(Registry::new(config.history_cap())),
            bus: Bus::new(config.bus_capacity_clamped()),
            config,
            parent,
            revision,
        }
    }

    /// Registers a task joining under `name`.
    ///
    /// Leaves the registry untouched and hands back the live occupant if
    /// another task holds `name`. Called with the joining task's lock held.
    pub(crate) fn admit(
        &self,
        id: TaskId,
        name: &TaskName,
        status: StatusDescription,
        handle: HandleFn<'_>,
    ) -> Result<(), TaskRef> {
        let mut registry = self.registry.lock();
        if let Some(occupant) = registry.occupant(name, id) {
            return Err(occupant);
        }

        if status == StatusDescription::Idle {
            registry.occupy(id, name, handle);
            self.bump();
        } else {
            self.record(&mut registry, id, name, status, handle);
        }
        Ok(())
    }

    fn release(&self, name: &TaskName, id: TaskId) {
        if self.registry.lock().release(name, id) {
            self.bump();
        }
    }

    /// Records one accepted transition. Called with the task's lock held.
    pub(crate) fn track(
        &self,
        id: TaskId,
        name: &TaskName,
        status: StatusDescription,
        handle: HandleFn<'_>,
    ) {
        let mut registry = self.registry.lock();
        self.record(&mut registry, id, name, status, handle);
    }

    fn record(
        &self,
        registry: &mut Registry,
        id: TaskId,
        name: &TaskName,
        status: StatusDescription,
        handle: HandleFn<'_>,
    ) {
        registry.apply(id, name, status, handle);
        tracing::trace!(task = %name, %id, %status, "pipeline tracked transition");
        self.bus.publish(TaskEvent::new(id, name.clone(), status));
        self.bump();
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

/// Cloneable handle to a pipeline.
///
/// # Example
/// ```
/// use taskpipe::{MutableTask, Pipeline, StatusDescription};
///
/// let pipeline = Pipeline::default();
/// let task = MutableTask::<u32, String>::from_action(|| 42);
/// pipeline.insert(&task, "sync").unwrap();
/// assert!(pipeline.lookup("sync").is_some());
///
/// task.start();
/// assert!(pipeline.lookup("sync").is_none());
/// assert_eq!(pipeline.last_status("sync"), Some(StatusDescription::Success));
/// ```
#[derive(Clone)]
pub struct Pipeline {
    shared: Arc<Shared>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared::new(config, None)),
        }
    }

    /// Creates a child pipeline with the same configuration and a weak link
    /// back to this one.
    pub fn child(&self) -> Pipeline {
        let parent = Arc::downgrade(&self.shared);
        Self {
            shared: Arc::new(Shared::new(self.shared.config.clone(), Some(parent))),
        }
    }

    /// Parent pipeline, if this is a child and the parent is still alive.
    pub fn parent(&self) -> Option<Pipeline> {
        let shared = self.shared.parent.as_ref()?.upgrade()?;
        Some(Pipeline { shared })
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Tracks `task` under `name`.
    ///
    /// Cancels any live task already registered under `name`, then names
    /// `task` and registers it as the live occupant. The occupant's `Canceled`
    /// reaches the pipeline stream before anything of `task`. Fails with
    /// [`TaskError::AlreadyInPipeline`] if `task` already joined a pipeline.
    pub fn insert<S, E>(
        &self,
        task: &MutableTask<S, E>,
        name: impl Into<TaskName>,
    ) -> Result<(), TaskError>
    where
        S: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        let name = name.into();
        let mut evicted: Option<TaskId> = None;

        // The occupant is cancelled with no lock held and before the newcomer
        // takes the name; a racing insert may claim it in between, so retry.
        while let Some(occupant) = task.attach(&self.shared, name.clone())? {
            let id = occupant.id();
            if evicted == Some(id) {
                tracing::warn!(task = %name, stale = %id, "live entry outlived its cancel; dropping it");
                self.shared.release(&name, id);
                continue;
            }
            tracing::debug!(task = %name, evicted = %id, "evicting live task with the same name");
            occupant.cancel();
            evicted = Some(id);
        }

        tracing::debug!(task = %name, id = %task.id(), "task inserted into pipeline");
        Ok(())
    }

    /// Live task registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<TaskRef> {
        self.shared.registry.lock().lookup(name)
    }

    /// Most recent terminal status recorded for `name`.
    pub fn last_status(&self, name: &str) -> Option<StatusDescription> {
        self.shared.registry.lock().last_status(name)
    }

    /// Terminal statuses recorded for `name`, oldest first.
    pub fn history(&self, name: &str) -> Vec<StatusDescription> {
        self.shared.registry.lock().history(name)
    }

    /// Returns sorted list of live task names.
    pub fn live_names(&self) -> Vec<TaskName> {
        self.shared.registry.lock().names()
    }

    /// Returns true if no task is live.
    pub fn is_empty(&self) -> bool {
        self.shared.registry.lock().is_empty()
    }

    /// Receiver of every transition of every tracked task.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.shared.bus.subscribe()
    }

    /// Revision counter bumped on every registry change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Cancels the live task under `name`. Returns `false` if there is none.
    pub fn cancel(&self, name: &str) -> bool {
        match self.lookup(name) {
            Some(task) => {
                task.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every live task.
    pub fn cancel_all(&self) {
        let tasks = self.shared.registry.lock().snapshot();
        tracing::debug!(count = tasks.len(), "cancelling all live tasks");
        for task in tasks {
            task.cancel();
        }
    }

    /// Drives `subscriber` with every pipeline event on a Tokio task.
    ///
    /// Runs until the returned guard is cancelled or dropped, or the pipeline
    /// is gone. Lag is logged and skipped.
    pub fn spawn_subscriber(&self, subscriber: Arc<dyn Subscribe>) -> Cancellable {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(subscriber = subscriber.name(), "spawn_subscriber needs a Tokio runtime");
            return Cancellable::empty();
        };

        let mut rx = self.subscribe();
        let token = CancellationToken::new();
        let stop = token.clone();

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => subscriber.on_event(&ev).await,
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(subscriber = subscriber.name(), skipped, "pipeline subscriber lagged");
                        }
                    },
                    _ = stop.cancelled() => break,
                }
            }
        });
        token.into()
    }

    /// Calls `f` with every status of tasks tracked under `name`.
    pub fn on_status_of<F>(&self, name: impl Into<TaskName>, f: F) -> Cancellable
    where
        F: FnMut(StatusDescription) + Send + 'static,
    {
        self.spawn_subscriber(Arc::new(NameFilter {
            name: name.into(),
            f: Mutex::new(f),
        }))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("live", &self.live_names())
            .field("child", &self.shared.parent.is_some())
            .finish()
    }
}

/// Subscriber forwarding the statuses of one name.
struct NameFilter<F> {
    name: TaskName,
    f: Mutex<F>,
}

#[async_trait::async_trait]
impl<F> Subscribe for NameFilter<F>
where
    F: FnMut(StatusDescription) + Send + 'static,
{
    async fn on_event(&self, event: &TaskEvent) {
        if event.name == self.name {
            let mut f = self.f.lock();
            (*f)(event.status);
        }
    }

    fn name(&self) -> &'static str {
        "name_filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::OpaqueTask;
    use crate::status::Status;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    type T = MutableTask<u32, String>;

    fn idle() -> T {
        T::new(|_| Cancellable::empty())
    }

    fn drain(rx: &mut broadcast::Receiver<TaskEvent>) -> Vec<(String, StatusDescription)> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| (ev.name.to_string(), ev.status))
            .collect()
    }

    #[test]
    fn immediate_success_emits_started_then_success() {
        let pipeline = Pipeline::default();
        let mut rx = pipeline.subscribe();
        let visible = Arc::new(AtomicBool::new(false));

        let (p, seen) = (pipeline.clone(), Arc::clone(&visible));
        let task = T::new(move |task| {
            seen.store(p.lookup("sync").is_some(), Ordering::SeqCst);
            task.succeed(42).ok();
            Cancellable::empty()
        });

        pipeline.insert(&task, "sync").unwrap();
        task.start();

        assert!(visible.load(Ordering::SeqCst), "task must be live while its body runs");
        assert!(pipeline.lookup("sync").is_none());
        assert_eq!(
            drain(&mut rx),
            vec![
                ("sync".to_string(), StatusDescription::Started),
                ("sync".to_string(), StatusDescription::Success),
            ]
        );
        assert_eq!(pipeline.last_status("sync"), Some(StatusDescription::Success));
        assert_eq!(task.status(), Status::Success(42));
    }

    #[test]
    fn lookup_is_live_only() {
        let pipeline = Pipeline::default();
        let task = idle();
        pipeline.insert(&task, "job").unwrap();
        task.start();

        let found = pipeline.lookup("job").unwrap();
        assert_eq!(found.id(), task.id());
        assert_eq!(pipeline.last_status("job"), None);

        task.fail("boom".into()).unwrap();
        assert!(pipeline.lookup("job").is_none());
        assert_eq!(pipeline.last_status("job"), Some(StatusDescription::Error));
        assert!(pipeline.lookup("missing").is_none());
    }

    #[test]
    fn reinsert_evicts_live_occupant() {
        let pipeline = Pipeline::default();
        let (t2, t3) = (idle(), idle());

        pipeline.insert(&t2, "slot").unwrap();
        t2.start();
        pipeline.insert(&t3, "slot").unwrap();

        assert_eq!(t2.status(), Status::Canceled);
        assert_eq!(pipeline.lookup("slot").map(|t| t.id()), Some(t3.id()));
        assert_eq!(pipeline.live_names(), vec![TaskName::from("slot")]);
    }

    #[test]
    fn reinsert_cancels_occupant_before_newcomer_joins() {
        let pipeline = Pipeline::default();
        let mut rx = pipeline.subscribe();
        let (t2, t3) = (idle(), idle());

        pipeline.insert(&t2, "slot").unwrap();
        t2.start();
        pipeline.insert(&t3, "slot").unwrap();
        t3.start();

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| (ev.id, ev.status))
            .collect();
        assert_eq!(
            events,
            vec![
                (t2.id(), StatusDescription::Started),
                (t2.id(), StatusDescription::Canceled),
                (t3.id(), StatusDescription::Started),
            ]
        );
        assert_eq!(pipeline.lookup("slot").map(|t| t.id()), Some(t3.id()));
        assert_eq!(pipeline.history("slot"), vec![StatusDescription::Canceled]);
    }

    #[test]
    fn insert_twice_is_rejected() {
        let (a, b) = (Pipeline::default(), Pipeline::default());
        let task = idle();
        a.insert(&task, "one").unwrap();

        let err = b.insert(&task, "two").unwrap_err();
        assert!(matches!(err, TaskError::AlreadyInPipeline { .. }));
        assert_eq!(task.name().as_str(), "one");

        let err = task.set_name("renamed").unwrap_err();
        assert!(matches!(err, TaskError::NameLocked { .. }));
    }

    #[test]
    fn finished_task_goes_straight_to_history() {
        let pipeline = Pipeline::default();
        let task = T::success(1);
        task.start();

        pipeline.insert(&task, "done").unwrap();
        assert!(pipeline.lookup("done").is_none());
        assert_eq!(pipeline.history("done"), vec![StatusDescription::Success]);
    }

    #[test]
    fn cancel_all_cancels_every_live_task() {
        let pipeline = Pipeline::default();
        let tasks: Vec<T> = (0..3).map(|_| idle()).collect();
        for (i, task) in tasks.iter().enumerate() {
            pipeline.insert(task, format!("t{i}")).unwrap();
        }
        tasks[0].start();

        pipeline.cancel_all();
        assert!(pipeline.is_empty());
        assert!(tasks.iter().all(|t| t.status() == Status::Canceled));
        assert!(!pipeline.cancel("t0"));
    }

    #[test]
    fn revision_bumps_on_change() {
        let pipeline = Pipeline::default();
        let changes = pipeline.changes();
        let before = *changes.borrow();

        let task = idle();
        pipeline.insert(&task, "job").unwrap();
        assert!(*changes.borrow() > before);
    }

    #[test]
    fn child_knows_parent_weakly() {
        let parent = Pipeline::default();
        let child = parent.child();
        assert!(child.parent().is_some());
        assert!(parent.parent().is_none());

        drop(parent);
        assert!(child.parent().is_none());
    }

    #[test]
    fn dropped_pipeline_stops_tracking() {
        let pipeline = Pipeline::default();
        let task = idle();
        pipeline.insert(&task, "job").unwrap();
        drop(pipeline);

        task.start();
        task.succeed(1).unwrap();
        assert_eq!(task.status(), Status::Success(1));
    }

    #[tokio::test]
    async fn on_status_of_filters_by_name() {
        let pipeline = Pipeline::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _guard = pipeline.on_status_of("watched", move |status| {
            let _ = tx.send(status);
        });

        let (watched, other) = (idle(), idle());
        pipeline.insert(&watched, "watched").unwrap();
        pipeline.insert(&other, "other").unwrap();
        other.start();
        watched.start();
        watched.succeed(1).unwrap();

        assert_eq!(rx.recv().await, Some(StatusDescription::Started));
        assert_eq!(rx.recv().await, Some(StatusDescription::Success));
    }
}
