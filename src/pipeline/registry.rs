//! # Name-keyed task registry.
//!
//! Plain data behind the pipeline lock: the live map and the per-name terminal
//! history. [`Shared`](super::core::Shared) owns the lock, the bus and the
//! change revision; this type only decides what the maps look like after each
//! tracked transition.
//!
//! ## Rules
//! - A terminal transition removes the live entry **only if** it belongs to the
//!   same [`TaskId`]; a newer task reusing the name is never dropped by an older
//!   one finishing.
//! - A non-terminal transition claims a vacant name; it never steals a name
//!   held by another task.
//! - History is a ring per name, bounded by `history_cap` (`None` = unbounded).
//! - Nothing here calls into a task; handles are only cloned.

use std::collections::{HashMap, VecDeque};

use crate::status::StatusDescription;
use crate::tasks::{HandleFn, TaskId, TaskName, TaskRef};

struct Entry {
    id: TaskId,
    task: TaskRef,
}

pub(crate) struct Registry {
    live: HashMap<TaskName, Entry>,
    history: HashMap<TaskName, VecDeque<StatusDescription>>,
    history_cap: Option<usize>,
}

impl Registry {
    pub(crate) fn new(history_cap: Option<usize>) -> Self {
        Self {
            live: HashMap::new(),
            history: HashMap::new(),
            history_cap,
        }
    }

    /// Live occupant of `name`, unless it is `id` itself.
    pub(crate) fn occupant(&self, name: &TaskName, id: TaskId) -> Option<TaskRef> {
        self.live
            .get(name)
            .filter(|entry| entry.id != id)
            .map(|entry| entry.task.clone())
    }

    /// Drops the live entry of `name` if it still belongs to `id`.
    pub(crate) fn release(&mut self, name: &TaskName, id: TaskId) -> bool {
        if self.live.get(name).is_some_and(|entry| entry.id == id) {
            self.live.remove(name);
            return true;
        }
        false
    }

    /// Registers `id` as the live occupant of `name`.
    pub(crate) fn occupy(&mut self, id: TaskId, name: &TaskName, handle: HandleFn<'_>) {
        self.live.insert(name.clone(), Entry { id, task: handle() });
    }

    /// Applies one accepted transition of task `id` tracked as `name`.
    pub(crate) fn apply(
        &mut self,
        id: TaskId,
        name: &TaskName,
        status: StatusDescription,
        handle: HandleFn<'_>,
    ) {
        if status.is_terminal() {
            self.release(name, id);
            self.push_history(name, status);
        } else if !self.live.contains_key(name) {
            self.occupy(id, name, handle);
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<TaskRef> {
        self.live.get(name).map(|entry| entry.task.clone())
    }

    pub(crate) fn last_status(&self, name: &str) -> Option<StatusDescription> {
        self.history.get(name).and_then(|ring| ring.back().copied())
    }

    pub(crate) fn history(&self, name: &str) -> Vec<StatusDescription> {
        self.history
            .get(name)
            .map(|ring| ring.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns sorted list of live task names.
    pub(crate) fn names(&self) -> Vec<TaskName> {
        let mut names: Vec<TaskName> = self.live.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn snapshot(&self) -> Vec<TaskRef> {
        self.live.values().map(|entry| entry.task.clone()).collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn push_history(&mut self, name: &TaskName, status: StatusDescription) {
        let ring = self.history.entry(name.clone()).or_default();
        if let Some(cap) = self.history_cap {
            while ring.len() >= cap {
                ring.pop_front();
            }
        }
        ring.push_back(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::Cancellable;
    use crate::tasks::MutableTask;

    fn task() -> MutableTask<(), ()> {
        MutableTask::new(|_| Cancellable::empty())
    }

    #[test]
    fn terminal_of_older_task_keeps_newer_entry() {
        let mut reg = Registry::new(None);
        let (old, new) = (task(), task());
        let name = TaskName::from("slot");

        reg.occupy(old.id(), &name, &|| old.to_ref());
        assert_eq!(reg.occupant(&name, new.id()).map(|t| t.id()), Some(old.id()));
        assert!(reg.occupant(&name, old.id()).is_none());
        reg.occupy(new.id(), &name, &|| new.to_ref());

        reg.apply(old.id(), &name, StatusDescription::Canceled, &|| old.to_ref());
        assert_eq!(reg.lookup("slot").map(|t| t.id()), Some(new.id()));
        assert_eq!(reg.last_status("slot"), Some(StatusDescription::Canceled));
    }

    #[test]
    fn release_only_drops_own_entry() {
        let mut reg = Registry::new(None);
        let (holder, other) = (task(), task());
        let name = TaskName::from("slot");

        reg.occupy(holder.id(), &name, &|| holder.to_ref());
        assert!(!reg.release(&name, other.id()));
        assert!(reg.lookup("slot").is_some());
        assert!(reg.release(&name, holder.id()));
        assert!(reg.is_empty());
    }

    #[test]
    fn non_terminal_never_steals_a_name() {
        let mut reg = Registry::new(None);
        let (old, new) = (task(), task());
        let name = TaskName::from("slot");

        reg.occupy(new.id(), &name, &|| new.to_ref());
        reg.apply(old.id(), &name, StatusDescription::Progress, &|| old.to_ref());
        assert_eq!(reg.lookup("slot").map(|t| t.id()), Some(new.id()));
    }

    #[test]
    fn history_ring_is_bounded() {
        let mut reg = Registry::new(Some(2));
        let t = task();
        let name = TaskName::from("job");

        for status in [
            StatusDescription::Success,
            StatusDescription::Error,
            StatusDescription::Canceled,
        ] {
            reg.apply(t.id(), &name, status, &|| t.to_ref());
        }

        assert_eq!(
            reg.history("job"),
            vec![StatusDescription::Error, StatusDescription::Canceled]
        );
        assert!(reg.history("other").is_empty());
        assert_eq!(reg.last_status("other"), None);
    }

    #[test]
    fn names_are_sorted() {
        let mut reg = Registry::new(None);
        let (a, b) = (task(), task());
        reg.occupy(b.id(), &"b".into(), &|| b.to_ref());
        reg.occupy(a.id(), &"a".into(), &|| a.to_ref());

        assert_eq!(reg.names(), vec![TaskName::from("a"), TaskName::from("b")]);
        assert_eq!(reg.snapshot().len(), 2);
        assert!(!reg.is_empty());
    }
}
