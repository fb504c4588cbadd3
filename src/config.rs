//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for pipelines and tasks.
//!
//! Config is used in two ways:
//! 1. **Pipeline creation**: `Pipeline::new(config)`
//! 2. **Task creation**: `MutableTask::with_config(&config, body)`
//!
//! ## Sentinel values
//! - `history_limit = 0` → unbounded history per name
//! - `bus_capacity = 0` / `status_capacity = 0` → clamped to 1

/// Global configuration for pipelines and tasks.
///
/// ## Field semantics
/// - `bus_capacity`: Pipeline event ring buffer size (min 1; clamped)
/// - `history_limit`: Terminal statuses retained per task name (`0` = unbounded)
/// - `status_capacity`: Per-task status channel size (min 1; clamped)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the pipeline event broadcast channel.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip the oldest items.
    pub bus_capacity: usize,

    /// Number of terminal statuses kept per task name.
    ///
    /// Oldest entries are dropped first. `0` keeps everything.
    pub history_limit: usize,

    /// Capacity of each task's status broadcast channel.
    ///
    /// A subscriber lagging more than this many transitions skips the oldest
    /// ones; the terminal status is always the newest and is never skipped.
    pub status_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the per-name history bound as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` entries per name
    #[inline]
    pub fn history_cap(&self) -> Option<usize> {
        if self.history_limit == 0 {
            None
        } else {
            Some(self.history_limit)
        }
    }

    /// Returns a status channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn status_capacity_clamped(&self) -> usize {
        self.status_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `history_limit = 32`
    /// - `status_capacity = 64`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            history_limit: 32,
            status_capacity: 64,
        }
    }
}
