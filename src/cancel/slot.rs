//! # Single-assignment cancellation cell.
//!
//! Holds the token a task body returns once it has started its background work.
//!
//! ```text
//! Empty ──assign──► Held ──cancel──► Cancelled
//!   │                                   ▲
//!   └──────────────cancel───────────────┘
//! Cancelled ──assign──► token cancelled on the spot
//! ```
//!
//! A cancel that arrives before the body hands its token back is remembered, so
//! the token is released the moment it is assigned instead of leaking.

use parking_lot::Mutex;

use super::Cancellable;

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Empty,
    Held(Cancellable),
    Cancelled,
}

/// Cell holding at most one [`Cancellable`].
#[derive(Debug, Default)]
pub struct CancellableSlot {
    state: Mutex<SlotState>,
}

impl CancellableSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `c`.
    ///
    /// Returns `false` when `c` was released instead: the slot was already
    /// cancelled, or it already holds a token (a second assignment is ignored
    /// and logged).
    pub fn assign(&self, c: Cancellable) -> bool {
        let rejected = {
            let mut state = self.state.lock();
            match &*state {
                SlotState::Empty => {
                    *state = SlotState::Held(c);
                    None
                }
                SlotState::Held(_) => {
                    tracing::warn!("cancellable slot already assigned; releasing the newcomer");
                    Some(c)
                }
                SlotState::Cancelled => Some(c),
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

    /// Cancels the held token, or marks the slot so a later assignment is
    /// cancelled immediately. Idempotent.
    pub fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SlotState::Cancelled);
        if let SlotState::Held(c) = previous {
            c.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Cancelled)
    }

    pub fn is_assigned(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Held(_))
    }
}
