//! Cancellable timer queue driven by explicit time.
//!
//! The queue never sleeps on its own. Callers ask for the next deadline, wait
//! however they like (`tokio::time::sleep_until` in production, paused virtual
//! time in tests), then drain the tasks that are due.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tokio::time::Instant;

/// Handle to a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Timer queue holding payloads of type `K`.
#[derive(Debug)]
pub struct Scheduler<K> {
    next_id: u64,
    queue: BTreeMap<(Instant, TaskId), K>,
    deadlines: HashMap<TaskId, Instant>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Scheduler<K> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Schedules `payload` to become due at `at`.
    pub fn schedule(&mut self, at: Instant, payload: K) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.insert((at, id), payload);
        self.deadlines.insert(id, at);
        id
    }

    /// Cancels a task. Returns the payload if the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> Option<K> {
        let at = self.deadlines.remove(&id)?;
        self.queue.remove(&(at, id))
    }

    /// Returns true if the task has neither fired nor been cancelled.
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Removes and returns every task due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TaskId, K)> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            let (at, id) = *entry.key();
            if at > now {
                break;
            }
            let payload = entry.remove();
            self.deadlines.remove(&id);
            due.push((id, payload));
        }
        due
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
