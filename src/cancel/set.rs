//! # Aggregate of cancellation handles.
//!
//! ## Rules
//! - [`CancellableSet::cancel_all`] releases every member and **closes** the set.
//! - Inserting into a closed set releases the newcomer immediately (no leaks).
//! - Release actions always run outside the internal lock.

use parking_lot::Mutex;

use super::Cancellable;

/// Set of handles cancelled together.
#[derive(Debug)]
pub struct CancellableSet {
    /// `None` once the set was cancelled.
    members: Mutex<Option<Vec<Cancellable>>>,
}

impl CancellableSet {
    /// Creates an open, empty set.
    pub fn new() -> Self {
        Self {
            members: Mutex::new(Some(Vec::new())),
        }
    }

    /// Adds a handle. Returns `false` (and cancels `c`) if the set is closed.
    pub fn insert(&self, c: Cancellable) -> bool {
        let rejected = {
            let mut members = self.members.lock();
            match members.as_mut() {
                Some(list) => {
                    list.push(c);
                    None
                }
                None => Some(c),
            }
        };

        match rejected {
            Some(c) => {
                c.cancel();
                false
            }
            None => true,
        }
    }

    /// Cancels every member and closes the set. Idempotent.
    pub fn cancel_all(&self) {
        let drained = self.members.lock().take();
        for c in drained.into_iter().flatten() {
            c.cancel();
        }
    }

    /// Returns `true` once [`cancel_all`](Self::cancel_all) ran.
    pub fn is_cancelled(&self) -> bool {
        self.members.lock().is_none()
    }

    /// Number of held handles (0 when closed).
    pub fn len(&self) -> usize {
        self.members.lock().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CancellableSet {
    fn default() -> Self {
        Self::new()
    }
}
