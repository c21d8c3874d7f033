//! Cooperative one-shot task scheduler.
//!
//! Everything that moves the controller forward is a deadline in this
//! scheduler: the repeating control tick, deferred operator requests and
//! the end of manual actuator tests.  The service drains due tasks in
//! deadline order from [`Scheduler::pop_due`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Task Sources                             │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ Control   │  │ Button    │  │ Remote    │  │ Manual   │   │
//! │  │ tick      │  │ press     │  │ command   │  │ test end │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        │ arm_tick     │      schedule_in(+1 ms)     │        │
//! │        ▼              ▼              ▼              ▼        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │        tick slot (≤ 1)      +     task slots           │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                    AppService.poll()                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one control tick is ever pending: arming a new one replaces
//! the previous deadline.

use log::warn;

use crate::app::commands::AppCommand;

// ═══════════════════════════════════════════════════════════════
//  Task types
// ═══════════════════════════════════════════════════════════════

/// Work the scheduler can hand back to the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Run one control-loop tick.
    ControlTick,
    /// Apply a deferred operator request.
    Command(AppCommand),
    /// Manual heater test timed out.
    EndHeaterTest,
    /// Manual fan test timed out.
    EndFanTest,
}

/// Smallest delay a deferred task can have (ms).
pub const MIN_DELAY_MS: u32 = 1;

/// Maximum number of pending non-tick tasks (stack-allocated).
const MAX_TASKS: usize = 8;

#[derive(Debug, Clone)]
struct Entry {
    due_ms: u64,
    /// Insertion order, breaks ties between equal deadlines.
    seq: u64,
    task: Task,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The scheduler engine.
///
/// Decoupled from time: callers pass `now_ms` in, so the same engine runs
/// against the monotonic clock on device and a simulated clock in tests.
pub struct Scheduler {
    /// Pending control tick `(due_ms, seq)`.
    tick: Option<(u64, u64)>,
    slots: [Option<Entry>; MAX_TASKS],
    next_seq: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tick: None,
            slots: [const { None }; MAX_TASKS],
            next_seq: 0,
        }
    }

    /// Arm the control tick for `at_ms`, replacing any pending tick.
    pub fn arm_tick(&mut self, at_ms: u64) {
        let seq = self.bump_seq();
        self.tick = Some((at_ms, seq));
    }

    /// Deadline of the pending control tick, if armed.
    pub fn tick_deadline(&self) -> Option<u64> {
        self.tick.map(|(due, _)| due)
    }

    /// Queue `task` to run `delay_ms` after `now_ms` (at least
    /// [`MIN_DELAY_MS`]).
    ///
    /// When every slot is taken the oldest queued operator command is
    /// evicted, so the most recent request always survives.  Returns
    /// `false` and drops the task only when no command can be evicted.
    pub fn schedule_in(&mut self, now_ms: u64, delay_ms: u32, task: Task) -> bool {
        let due_ms = now_ms + u64::from(delay_ms.max(MIN_DELAY_MS));
        let seq = self.bump_seq();
        let index = match self.slots.iter().position(Option::is_none) {
            Some(free) => free,
            None => match self.oldest_command() {
                Some(oldest) => {
                    warn!(
                        "Scheduler: queue full, evicting {:?}",
                        self.slots[oldest].as_ref().map(|e| &e.task)
                    );
                    oldest
                }
                None => {
                    warn!("Scheduler: queue full, dropping {:?}", task);
                    return false;
                }
            },
        };
        self.slots[index] = Some(Entry { due_ms, seq, task });
        true
    }

    /// Slot holding the earliest-scheduled operator command.
    fn oldest_command(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (i, e)))
            .filter(|(_, e)| matches!(e.task, Task::Command(_)))
            .min_by_key(|(_, e)| e.seq)
            .map(|(i, _)| i)
    }

    /// Remove and return the earliest task due at or before `now_ms`.
    /// Equal deadlines come out in the order they were scheduled.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Task> {
        let best_slot = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (i, e.due_ms, e.seq)))
            .filter(|&(_, due, _)| due <= now_ms)
            .min_by_key(|&(_, due, seq)| (due, seq));

        let tick_due = self.tick.filter(|&(due, _)| due <= now_ms);

        match (tick_due, best_slot) {
            (Some((t_due, t_seq)), Some((_, s_due, s_seq))) if (t_due, t_seq) < (s_due, s_seq) => {
                self.tick = None;
                Some(Task::ControlTick)
            }
            (Some(_), None) => {
                self.tick = None;
                Some(Task::ControlTick)
            }
            (_, Some((i, _, _))) => self.slots[i].take().map(|e| e.task),
            (None, None) => None,
        }
    }

    /// Earliest pending deadline across the tick and all tasks.
    pub fn next_deadline(&self) -> Option<u64> {
        let tasks = self.slots.iter().flatten().map(|e| e.due_ms);
        self.tick_deadline().into_iter().chain(tasks).min()
    }

    /// Number of pending non-tick tasks.
    pub fn pending(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Drop every pending task matching `pred`.
    pub fn cancel_where(&mut self, pred: impl Fn(&Task) -> bool) {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|e| pred(&e.task)) {
                *slot = None;
            }
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
