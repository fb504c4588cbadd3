//! # Cancellation plumbing.
//!
//! - [`Cancellable`] releases one resource exactly once (on `cancel()` or drop);
//! - [`CancellableSet`] aggregates many; cancelling the set cancels every member;
//! - [`CancellableSlot`] holds at most one and never loses an early cancel.
//!
//! Tokens come from [`tokio_util::sync::CancellationToken`], Tokio abort handles
//! or plain closures, so a task body can hand back whatever its background work uses.

mod cancellable;
mod set;
mod slot;

pub use cancellable::Cancellable;
pub use set::CancellableSet;
pub use slot::CancellableSlot;
