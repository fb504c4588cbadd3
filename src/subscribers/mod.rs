//! # Pipeline event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the built-in
//! [`LogWriter`] (feature `logging`) for handling events broadcast by a
//! [`Pipeline`](crate::Pipeline).
//!
//! ## Architecture
//! ```text
//! Task ── track ──► Pipeline bus ──► spawn_subscriber() task ──► Subscribe::on_event(&TaskEvent)
//!                                                                   │
//!                                                          ┌────────┼─────────┐
//!                                                          ▼        ▼         ▼
//!                                                      LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
