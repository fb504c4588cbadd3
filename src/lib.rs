//! # taskpipe
//!
//! **Taskpipe** models asynchronous units of work as observable, cancelable,
//! nameable state machines, and tracks them by name in pipelines.
//!
//! A task moves through `Idle → Started → Progress* → Success | Error | Canceled`
//! exactly once. Every accepted transition is multicast to the task's own
//! subscribers and reported to the pipeline it belongs to, which keeps the live
//! handle while the task runs and a bounded terminal history afterwards.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//!     │ MutableTask  │   │ MutableTask  │   │ ParametrizedTask │
//!     │  (body #1)   │   │  (body #2)   │   │   (body #3)      │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────────┘
//!            │ predecessor gate │                  │
//!            └──────────────────┘                  │
//!            ▼ track (weak link, task lock held)   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Pipeline                                                         │
//! │  - live:    name → TaskRef          (lookup, cancel, cancel_all)  │
//! │  - history: name → terminal ring    (last_status, history)        │
//! │  - Bus (broadcast TaskEvent)        (subscribe, spawn_subscriber) │
//! │  - revision (watch)                 (changes)                     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! MutableTask::new(body) ──► Pipeline::insert(&task, name) ──► task.start()
//!
//! start()
//!   ├─► Started
//!   ├─► body(task) → Cancellable (kept until terminal)
//!   │       │
//!   │       ├─ task.progress(..) ─► Progress
//!   │       ├─ task.succeed(v)   ─► Success(v)
//!   │       └─ task.fail(e)      ─► Error(e)
//!   │
//!   └─ cancel() at any time     ─► Canceled, body token released
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                     |
//! |-------------------|---------------------------------------------------------------|----------------------------------------|
//! | **Tasks**         | Typed state machines driven by a body closure                 | [`MutableTask`], [`Task`], [`Status`]  |
//! | **Type erasure**  | Payload-free handles for heterogeneous storage                | [`OpaqueTask`], [`TaskRef`]            |
//! | **Pipelines**     | Name → live task registry with terminal history               | [`Pipeline`], [`TaskEvent`]            |
//! | **Cancellation**  | Release-once handles, sets and single-assignment slots       | [`Cancellable`], [`CancellableSet`]    |
//! | **Subscriptions** | Pipeline-wide event handlers                                  | [`Subscribe`]                          |
//!
//! ## Optional features
//! - `logging`: exports a tracing-backed [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use taskpipe::{MutableTask, Pipeline, Status, StatusDescription};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let pipeline = Pipeline::default();
//!
//!     let fetch = MutableTask::<u32, String>::from_future(async { Ok(42) });
//!     let report = MutableTask::<String, String>::from_action(|| "done".into())
//!         .with_predecessor(fetch.to_ref());
//!
//!     pipeline.insert(&fetch, "fetch").unwrap();
//!     pipeline.insert(&report, "report").unwrap();
//!
//!     report.start();
//!     fetch.start();
//!
//!     assert_eq!(report.wait().await, Status::Success("done".into()));
//!     assert_eq!(pipeline.last_status("fetch"), Some(StatusDescription::Success));
//! }
//! ```

mod cancel;
mod config;
mod error;
mod pipeline;
mod status;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use cancel::{Cancellable, CancellableSet, CancellableSlot};
pub use config::Config;
pub use error::TaskError;
pub use pipeline::{Pipeline, TaskEvent};
pub use status::{Progress, Status, StatusDescription, StatusMatch};
pub use subscribers::Subscribe;
pub use tasks::{
    Body, DescriptionStream, MutableTask, OpaqueTask, OpaqueTaskExt, ParametrizedTask, Resolver,
    StatusStream, Task, TaskId, TaskName, TaskRef, downcast,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
