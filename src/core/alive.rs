//! Task lifecycle tracker with sequence-based ordering.
//!
//! Maintains the authoritative set of currently alive tasks by watching
//! lifecycle events, using event sequence numbers to reject out-of-order
//! delivery. The supervisor consults it at shutdown to name the tasks that
//! did not stop within the grace period.
//!
//! ## Rules
//! - Only `TaskStarting` / `TaskStopped` / `TaskFailed` change alive state.
//! - Events with `seq <= last_seq` for a task are rejected as stale.
//! - Reads are eventually consistent with the event stream.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::events::{Event, EventKind};

/// Per-task state for ordering validation.
#[derive(Debug, Clone)]
struct TaskState {
    /// Last seen sequence number for this task.
    last_seq: u64,
    /// Current status (true = alive, false = stopped).
    alive: bool,
}

/// Thread-safe tracker of alive tasks.
#[derive(Debug, Default)]
pub(crate) struct AliveTracker {
    state: RwLock<HashMap<String, TaskState>>,
}

impl AliveTracker {
    /// Creates a new empty tracker.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Updates task state if the event is newer than the last seen one.
    ///
    /// `TaskStarting` marks the task alive; `TaskStopped` and `TaskFailed`
    /// mark it stopped. Other kinds are ignored.
    pub(crate) fn update(&self, ev: &Event) {
        let alive = match ev.kind {
            EventKind::TaskStarting => true,
            EventKind::TaskStopped | EventKind::TaskFailed => false,
            _ => return,
        };
        let name = match ev.task.as_deref() {
            Some(n) => n,
            None => return,
        };

        let mut state = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = state.entry(name.to_string()).or_insert(TaskState {
            last_seq: 0,
            alive: false,
        });
        if ev.seq > entry.last_seq || entry.last_seq == 0 {
            entry.last_seq = ev.seq;
            entry.alive = alive;
        }
    }

    /// Returns the names of tasks currently believed alive.
    pub(crate) fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .iter()
            .filter(|(_, s)| s.alive)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, task: &str) -> Event {
        Event::new(kind).with_task(task.to_string())
    }

    #[test]
    fn starting_then_stopped_leaves_task_dead() {
        let tracker = AliveTracker::new();
        tracker.update(&ev(EventKind::TaskStarting, "alarm"));
        assert_eq!(tracker.snapshot(), vec!["alarm".to_string()]);

        tracker.update(&ev(EventKind::TaskStopped, "alarm"));
        assert!(tracker.snapshot().is_empty());
    }

    #[test]
    fn stale_events_are_rejected() {
        let tracker = AliveTracker::new();
        let start = ev(EventKind::TaskStarting, "uplink");
        let stop = ev(EventKind::TaskStopped, "uplink");

        // Deliver out of order: the older start must not resurrect the task.
        tracker.update(&stop);
        tracker.update(&start);
        assert!(tracker.snapshot().is_empty());
    }

    #[test]
    fn non_lifecycle_events_are_ignored() {
        let tracker = AliveTracker::new();
        tracker.update(&ev(EventKind::DataSent, "uplink"));
        assert!(tracker.snapshot().is_empty());
    }
}
