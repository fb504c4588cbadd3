//! # Pipelines: tracking tasks by name.
//!
//! - [`Pipeline`] - live registry, terminal history, merged event stream
//! - [`TaskEvent`] - one `(name, status)` observation on the pipeline bus
//!
//! ## Architecture
//! ```text
//! task A ──┐                        ┌──► subscribe()        (broadcast::Receiver)
//! task B ──┼── track ──► Pipeline ──┼──► changes()          (watch revision)
//! task C ──┘   (weak)     │         └──► spawn_subscriber() (Subscribe impls)
//!                         ├─ live:    name → TaskRef   (until terminal)
//!                         └─ history: name → ring of terminal statuses
//! ```

mod bus;
mod core;
mod event;
mod registry;

pub use self::core::Pipeline;
pub use event::TaskEvent;

pub(crate) use self::core::Shared;
