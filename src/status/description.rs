//! # Coarse status taxonomy.
//!
//! [`StatusDescription`] drops success/error payloads so that tasks with
//! different concrete types can be compared, stored and rendered together.
//!
//! | Description | output | failure | active | terminal |
//! |-------------|--------|---------|--------|----------|
//! | `Idle`      |        |         |        |          |
//! | `Started`   | ✓      |         | ✓      |          |
//! | `Progress`  | ✓      |         | ✓      |          |
//! | `Success`   | ✓      |         |        | ✓        |
//! | `Error`     |        | ✓       |        | ✓        |
//! | `Canceled`  |        | ✓       |        | ✓        |

use std::fmt;

/// Payload-free projection of a task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDescription {
    Idle,
    Started,
    Progress,
    Canceled,
    Success,
    Error,
}

impl StatusDescription {
    /// `Started`, `Progress` or `Success`.
    #[inline]
    pub fn is_output(&self) -> bool {
        matches!(
            self,
            StatusDescription::Started | StatusDescription::Progress | StatusDescription::Success
        )
    }

    /// `Canceled` or `Error`.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, StatusDescription::Canceled | StatusDescription::Error)
    }

    /// `Started` or `Progress`.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, StatusDescription::Started | StatusDescription::Progress)
    }

    /// `Canceled`, `Success` or `Error`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatusDescription::Canceled | StatusDescription::Success | StatusDescription::Error
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StatusDescription::Idle => "idle",
            StatusDescription::Started => "started",
            StatusDescription::Progress => "progress",
            StatusDescription::Canceled => "canceled",
            StatusDescription::Success => "success",
            StatusDescription::Error => "error",
        }
    }
}

impl fmt::Display for StatusDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Coarse comparison used by renderers that only care about "is anything going on".
///
/// An absent description (no task, no history) matches only [`StatusMatch::Idle`].
///
/// # Example
/// ```
/// use taskpipe::{StatusDescription, StatusMatch};
///
/// assert!(StatusMatch::Idle.matches(None));
/// assert!(StatusMatch::Active.matches(Some(StatusDescription::Progress)));
/// assert!(StatusMatch::Failure.matches(Some(StatusDescription::Canceled)));
/// assert!(!StatusMatch::Active.matches(None));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusMatch {
    Idle,
    Active,
    Failure,
}

impl StatusMatch {
    pub fn matches(&self, description: Option<StatusDescription>) -> bool {
        match (self, description) {
            (StatusMatch::Idle, None) => true,
            (StatusMatch::Idle, Some(d)) => d == StatusDescription::Idle,
            (StatusMatch::Active, Some(d)) => d.is_active(),
            (StatusMatch::Failure, Some(d)) => d.is_failure(),
            (StatusMatch::Active | StatusMatch::Failure, None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [StatusDescription; 6] = [
        StatusDescription::Idle,
        StatusDescription::Started,
        StatusDescription::Progress,
        StatusDescription::Canceled,
        StatusDescription::Success,
        StatusDescription::Error,
    ];

    #[test]
    fn output_and_failure_are_disjoint() {
        for d in ALL {
            assert!(!(d.is_output() && d.is_failure()), "{d}");
        }
    }

    #[test]
    fn active_is_output_but_not_terminal() {
        for d in ALL.into_iter().filter(StatusDescription::is_active) {
            assert!(d.is_output());
            assert!(!d.is_terminal());
        }
    }

    #[test]
    fn idle_is_nothing() {
        let idle = StatusDescription::Idle;
        assert!(!idle.is_output() && !idle.is_failure() && !idle.is_active() && !idle.is_terminal());
        assert!(StatusMatch::Idle.matches(Some(idle)));
        assert!(!StatusMatch::Failure.matches(Some(idle)));
    }
}
