//! # Task status model.
//!
//! - [`Status`] full status of a task, carrying its success/error payloads;
//! - [`StatusDescription`] payload-free projection used for type-erased handles;
//! - [`StatusMatch`] coarse comparison against an optional description;
//! - [`Progress`] structured progress payload.
//!
//! ## State graph
//! ```text
//! Idle ──► Started ──► Progress* ──┬──► Success
//!   │                              ├──► Error
//!   │                              └──► Canceled
//!   └──────────────────────────────────► Canceled
//! ```
//! Terminal statuses (`Success`, `Error`, `Canceled`) are absorbing.

mod description;
mod progress;
mod state;

pub use description::{StatusDescription, StatusMatch};
pub use progress::Progress;
pub use state::Status;
