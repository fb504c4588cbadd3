//! # Logging subscriber for debugging and demos.
//!
//! [`LogWriter`] renders every pipeline event through `tracing` at `INFO`.
//!
//! ## Output format (fields)
//! ```text
//! task status seq=3 task=sync id=task-7 status=started
//! task status seq=4 task=sync id=task-7 status=success
//! ```
//!
//! ## Example
//! ```no_run
//! # use std::sync::Arc;
//! # use taskpipe::{LogWriter, Pipeline};
//! # async fn demo() {
//! let pipeline = Pipeline::default();
//! let _guard = pipeline.spawn_subscriber(Arc::new(LogWriter));
//! # }
//! ```

use async_trait::async_trait;

use super::Subscribe;
use crate::pipeline::TaskEvent;

/// `tracing`-backed logging subscriber.
///
/// Enabled via the `logging` feature. Failures and cancellations are logged at
/// `WARN`, everything else at `INFO`.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &TaskEvent) {
        if e.status.is_failure() {
            tracing::warn!(seq = e.seq, task = %e.name, id = %e.id, status = %e.status, "task status");
        } else {
            tracing::info!(seq = e.seq, task = %e.name, id = %e.id, status = %e.status, "task status");
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
