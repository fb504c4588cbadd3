//! # Full task status.
//!
//! [`Status`] is what a concrete task publishes to its own subscribers. It keeps
//! the typed payloads; [`StatusDescription`] is the erased view of it.

use super::description::StatusDescription;
use super::progress::Progress;

/// Current status of a task with success type `S` and error type `E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status<S, E> {
    /// Created, not started. Initial and never re-entered.
    Idle,
    /// Body is running.
    Started,
    /// Body reported progress (optionally structured).
    Progress(Option<Progress>),
    /// Finished with a value. Terminal.
    Success(S),
    /// Finished with a domain error. Terminal.
    Error(E),
    /// Cancelled before finishing. Terminal.
    Canceled,
}

impl<S, E> Status<S, E> {
    /// Payload-free projection of this status.
    pub fn description(&self) -> StatusDescription {
        match self {
            Status::Idle => StatusDescription::Idle,
            Status::Started => StatusDescription::Started,
            Status::Progress(_) => StatusDescription::Progress,
            Status::Success(_) => StatusDescription::Success,
            Status::Error(_) => StatusDescription::Error,
            Status::Canceled => StatusDescription::Canceled,
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, Status::Idle)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.description().is_terminal()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.description().is_active()
    }

    /// Returns the success value, if this is `Success`.
    pub fn success_value(&self) -> Option<&S> {
        match self {
            Status::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the error value, if this is `Error`.
    pub fn error_value(&self) -> Option<&E> {
        match self {
            Status::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the progress payload, if this is `Progress` with one.
    pub fn progress(&self) -> Option<Progress> {
        match self {
            Status::Progress(p) => *p,
            _ => None,
        }
    }

    /// Converts a terminal status into a result.
    ///
    /// `Canceled` and non-terminal statuses yield `None`.
    pub fn into_result(self) -> Option<Result<S, E>> {
        match self {
            Status::Success(v) => Some(Ok(v)),
            Status::Error(e) => Some(Err(e)),
            _ => None,
        }
    }

    /// Checks whether `self -> next` is an edge of the state graph.
    pub(crate) fn can_transition_to(&self, next: &Status<S, E>) -> bool {
        use StatusDescription as D;

        match (self.description(), next.description()) {
            (D::Idle, D::Started | D::Canceled) => true,
            (D::Started | D::Progress, D::Progress | D::Success | D::Error | D::Canceled) => true,
            _ => false,
        }
    }
}

impl<S, E> From<Result<S, E>> for Status<S, E> {
    fn from(result: Result<S, E>) -> Self {
        match result {
            Ok(v) => Status::Success(v),
            Err(e) => Status::Error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type St = Status<u32, String>;

    #[test]
    fn graph_edges() {
        assert!(St::Idle.can_transition_to(&St::Started));
        assert!(St::Idle.can_transition_to(&St::Canceled));
        assert!(!St::Idle.can_transition_to(&St::Success(1)));
        assert!(!St::Idle.can_transition_to(&St::Progress(None)));

        assert!(St::Started.can_transition_to(&St::Progress(None)));
        assert!(St::Progress(None).can_transition_to(&St::Progress(None)));
        assert!(St::Progress(None).can_transition_to(&St::Error("x".into())));
        assert!(!St::Started.can_transition_to(&St::Started));
        assert!(!St::Started.can_transition_to(&St::Idle));
    }

    #[test]
    fn terminal_statuses_are_absorbing() {
        for terminal in [St::Success(1), St::Error("e".into()), St::Canceled] {
            assert!(terminal.is_terminal());
            for next in [
                St::Idle,
                St::Started,
                St::Progress(None),
                St::Success(2),
                St::Error("f".into()),
                St::Canceled,
            ] {
                assert!(!terminal.can_transition_to(&next));
            }
        }
    }

    #[test]
    fn into_result_drops_cancellation() {
        assert_eq!(St::Success(7).into_result(), Some(Ok(7)));
        assert_eq!(St::Error("no".into()).into_result(), Some(Err("no".to_string())));
        assert_eq!(St::Canceled.into_result(), None);
        assert_eq!(St::Started.into_result(), None);
    }
}
