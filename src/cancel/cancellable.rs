//! # Single-shot cancellation handle.
//!
//! ## Rules
//! - The underlying action runs **at most once**: on [`Cancellable::cancel`] or on drop.
//! - [`Cancellable::detach`] drops the handle without running the action.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskpipe::Cancellable;
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let h = Arc::clone(&hits);
//! let c = Cancellable::new(move || { h.fetch_add(1, Ordering::SeqCst); });
//!
//! c.cancel();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;

use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;

enum Action {
    Token(CancellationToken),
    Abort(AbortHandle),
    Callback(Box<dyn FnOnce() + Send + 'static>),
}

/// Handle that releases an associated resource exactly once.
#[must_use = "dropping a Cancellable cancels it immediately"]
pub struct Cancellable {
    action: Option<Action>,
}

impl Cancellable {
    /// A handle with nothing to release.
    pub fn empty() -> Self {
        Self { action: None }
    }

    /// A handle that runs `f` when cancelled.
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Some(Action::Callback(Box::new(f))),
        }
    }

    /// Runs the release action (if any).
    pub fn cancel(mut self) {
        self.release();
    }

    /// Drops the handle **without** releasing the resource.
    pub fn detach(mut self) {
        self.action = None;
    }

    /// Returns `true` if there is nothing left to release.
    pub fn is_empty(&self) -> bool {
        self.action.is_none()
    }

    fn release(&mut self) {
        match self.action.take() {
            Some(Action::Token(token)) => token.cancel(),
            Some(Action::Abort(handle)) => handle.abort(),
            Some(Action::Callback(f)) => f(),
            None => {}
        }
    }
}

impl Default for Cancellable {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for Cancellable {
    fn drop(&mut self) {
        self.release();
    }
}

impl From<CancellationToken> for Cancellable {
    fn from(token: CancellationToken) -> Self {
        Self {
            action: Some(Action::Token(token)),
        }
    }
}

impl From<AbortHandle> for Cancellable {
    fn from(handle: AbortHandle) -> Self {
        Self {
            action: Some(Action::Abort(handle)),
        }
    }
}

impl<T> From<JoinHandle<T>> for Cancellable {
    fn from(handle: JoinHandle<T>) -> Self {
        handle.abort_handle().into()
    }
}

impl fmt::Debug for Cancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.action {
            Some(Action::Token(_)) => "token",
            Some(Action::Abort(_)) => "abort",
            Some(Action::Callback(_)) => "callback",
            None => "empty",
        };
        f.debug_struct("Cancellable").field("kind", &kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Cancellable) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let c = Cancellable::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        (hits, c)
    }

    #[test]
    fn drop_cancels_once() {
        let (hits, c) = counter();
        drop(c);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn detach_skips_release() {
        let (hits, c) = counter();
        c.detach();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn token_is_cancelled() {
        let token = CancellationToken::new();
        Cancellable::from(token.clone()).cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn join_handle_is_aborted() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });

        Cancellable::from(handle).cancel();
        // Aborting drops the future, and with it the sender.
        assert!(rx.await.is_err());
    }
}
