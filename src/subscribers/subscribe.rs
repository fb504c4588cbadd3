//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom handlers into a
//! pipeline's event stream. Each subscriber is driven by its own Tokio task,
//! started with [`Pipeline::spawn_subscriber`](crate::Pipeline::spawn_subscriber).
//!
//! ## Contract
//! - Events arrive one at a time, in bus order.
//! - A slow subscriber only delays itself; if it falls more than
//!   `Config::bus_capacity` events behind, the oldest are skipped (warn).
//!
//! ## Example
//! ```rust
//! use taskpipe::{Subscribe, TaskEvent};
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &TaskEvent) {
//!         if ev.is_terminal() {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use async_trait::async_trait;

use crate::pipeline::TaskEvent;

/// Contract for pipeline event subscribers.
///
/// Called from a subscriber-dedicated Tokio task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &TaskEvent);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
