/// Units-of-work progress reported by a running task.
///
/// `total = None` means the amount of work is not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Progress {
    /// Units completed so far.
    pub completed: u64,
    /// Total units, if known.
    pub total: Option<u64>,
}

impl Progress {
    /// Progress with a known total.
    pub fn new(completed: u64, total: u64) -> Self {
        Self {
            completed,
            total: Some(total),
        }
    }

    /// Progress without a known total.
    pub fn indeterminate(completed: u64) -> Self {
        Self {
            completed,
            total: None,
        }
    }

    /// Completed fraction in `0.0..=1.0`, or `None` when the total is unknown.
    ///
    /// A zero total counts as finished.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            None => None,
            Some(0) => Some(1.0),
            Some(total) => Some((self.completed.min(total) as f64) / (total as f64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_clamped() {
        assert_eq!(Progress::new(5, 10).fraction(), Some(0.5));
        assert_eq!(Progress::new(12, 10).fraction(), Some(1.0));
        assert_eq!(Progress::new(0, 0).fraction(), Some(1.0));
        assert_eq!(Progress::indeterminate(3).fraction(), None);
    }
}
