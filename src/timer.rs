//! One-shot task types and the virtual-clock task queue.
//!
//! The relay core never blocks: "wait 50 ms" is a [`Task`] handed to a
//! [`TimerService`]. Each schedule returns a [`TaskToken`] that the owner
//! keeps until the task fires or is cancelled. Tokens are neither `Clone`
//! nor `Copy`, so a relay can hold at most one live schedule and must give
//! the token back to cancel it.
//!
//! [`SimTimer`] is a deterministic in-memory implementation driven by an
//! explicit clock. Tests and the `relay-sim` binary use it; firmware
//! provides its own [`TimerService`] over the hardware timer.

use core::fmt;

use heapless::Vec;
use log::{debug, error};

use crate::app::ports::TimerService;
use crate::relay::RelayId;

/// Work the relay core asks the timer to run later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Cut off the relay's in-flight pulse.
    EndPulse(RelayId),
    /// Try again to start a pulse that found the rail busy.
    RetryPulse(RelayId),
    /// Allow pulse starts again after the minimum spacing.
    ReopenGate,
}

/// Proof of a pending schedule.
#[derive(Debug, PartialEq, Eq)]
pub struct TaskToken(u32);

impl TaskToken {
    /// Wrap a schedule id minted by a [`TimerService`] implementation.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An expired task, delivered back to the relay service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub task: Task,
    /// Id of the token returned when the task was scheduled.
    pub token_id: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Virtual-clock queue
// ═══════════════════════════════════════════════════════════════

/// Capacity of the [`SimTimer`] queue. One slot per relay plus the gate.
pub const QUEUE_DEPTH: usize = crate::relay::MAX_RELAYS + 1;

#[derive(Debug, Clone, Copy)]
struct Entry {
    due_ms: u64,
    id: u32,
    task: Task,
}

/// Deterministic task queue on a manually advanced millisecond clock.
///
/// Tasks due on the same tick fire in the order they were scheduled.
#[derive(Debug, Default)]
pub struct SimTimer {
    now_ms: u64,
    next_id: u32,
    queue: Vec<Entry, QUEUE_DEPTH>,
}

impl SimTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of tasks waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether a task equal to `task` is waiting to fire.
    pub fn is_scheduled(&self, task: Task) -> bool {
        self.queue.iter().any(|e| e.task == task)
    }

    /// Expiry time of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.iter().map(|e| e.due_ms).min()
    }

    /// Remove and return the earliest task due at or before `until_ms`,
    /// moving the clock to its expiry time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired> {
        // Ids grow monotonically, so (due, id) orders same-tick tasks by
        // scheduling order.
        let (index, entry) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= until_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.id))
            .map(|(i, e)| (i, *e))?;

        self.queue.remove(index);
        self.now_ms = self.now_ms.max(entry.due_ms);
        Some(Fired {
            task: entry.task,
            token_id: entry.id,
        })
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

impl TimerService for SimTimer {
    fn schedule(&mut self, task: Task, delay_ms: u32) -> TaskToken {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let entry = Entry {
            due_ms: self.now_ms + u64::from(delay_ms),
            id,
            task,
        };
        debug!("timer: {:?} #{} due at {}ms", task, id, entry.due_ms);
        if self.queue.push(entry).is_err() {
            // Each relay holds at most one token and the gate one more, so
            // this only happens if tokens are leaked.
            error!("timer: queue full, {:?} #{} dropped", task, id);
        }
        TaskToken::new(id)
    }

    fn unschedule(&mut self, token: TaskToken) {
        if let Some(index) = self.queue.iter().position(|e| e.id == token.id()) {
            let entry = self.queue.remove(index);
            debug!("timer: {:?} {} cancelled", entry.task, token);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
