//! Cooperative periodic task scheduler.
//!
//! One fast loop (typically every 1 ms) calls [`Scheduler::tick`] with
//! the current time.  The scheduler works out which tasks are due and
//! notifies a [`SchedulerDelegate`]; the wiring code implements the
//! delegate to call into the drivers.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Main loop (1 ms)                       │
//! │                             │                                │
//! │                             ▼                                │
//! │                      Scheduler.tick(now)                     │
//! │        ┌────────────────────┼────────────────────┐           │
//! │        ▼                    ▼                    ▼           │
//! │  ┌───────────┐       ┌─────────────┐      ┌──────────────┐   │
//! │  │SensorTick │       │ AudioUpdate │      │ Housekeeping │   │
//! │  │  (1 kHz)  │       │   (50 Hz)   │      │    (1 Hz)    │   │
//! │  └─────┬─────┘       └──────┬──────┘      └──────┬───────┘   │
//! │        ▼                    ▼                    ▼           │
//! │   Sht31.tick()     AudioVario.update()       status log      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timestamps wrap at `u32::MAX`; all comparisons use `wrapping_sub`.

use crate::app::ports::{SchedulerDelegate, TaskId};
use log::info;

// ═══════════════════════════════════════════════════════════════
//  Task types
// ═══════════════════════════════════════════════════════════════

/// A periodic task registration.
#[derive(Debug, Clone)]
pub struct Task {
    /// Human-readable label (e.g., "sht31").
    pub label: &'static str,
    pub id: TaskId,
    /// Minimum spacing between runs.
    pub period_ms: u32,
    /// Whether this task is currently enabled.
    pub enabled: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent tasks (stack-allocated).
const MAX_TASKS: usize = 4;

pub struct Scheduler {
    tasks: [Option<TaskEntry>; MAX_TASKS],
    /// Global enable flag.
    enabled: bool,
}

/// Internal bookkeeping for a registered task.
#[derive(Debug, Clone)]
struct TaskEntry {
    task: Task,
    /// `None` until the first run, which happens on the first tick.
    last_run_ms: Option<u32>,
    runs: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: [None, None, None, None],
            enabled: true,
        }
    }

    /// Add a task.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, task: Task) -> Option<usize> {
        for (i, slot) in self.tasks.iter_mut().enumerate() {
            if slot.is_none() {
                info!("Scheduler: added '{}' every {}ms at slot {}", task.label, task.period_ms, i);
                *slot = Some(TaskEntry {
                    task,
                    last_run_ms: None,
                    runs: 0,
                });
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Remove a task by slot index.
    pub fn remove(&mut self, slot: usize) {
        if slot < MAX_TASKS {
            if let Some(entry) = &self.tasks[slot] {
                info!("Scheduler: removed '{}' from slot {}", entry.task.label, slot);
            }
            self.tasks[slot] = None;
        }
    }

    /// Enable or disable a single task.
    pub fn set_task_enabled(&mut self, slot: usize, enabled: bool) {
        if let Some(Some(entry)) = self.tasks.get_mut(slot) {
            entry.task.enabled = enabled;
        }
    }

    /// Enable or disable the entire scheduler.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Run every task that is due at `now_ms`.
    ///
    /// Each due task fires at most once per call, even if the loop fell
    /// behind by several periods; missed runs are not replayed.
    pub fn tick(&mut self, now_ms: u32, delegate: &mut dyn SchedulerDelegate) {
        if !self.enabled {
            return;
        }

        for slot in &mut self.tasks {
            let entry = match slot {
                Some(e) if e.task.enabled => e,
                _ => continue,
            };

            let due = entry
                .last_run_ms
                .is_none_or(|last| now_ms.wrapping_sub(last) >= entry.task.period_ms);
            if due {
                entry.last_run_ms = Some(now_ms);
                entry.runs = entry.runs.wrapping_add(1);
                delegate.on_task_due(entry.task.label, entry.task.id);
            }
        }
    }

    /// Number of times the task in `slot` has run.
    pub fn runs(&self, slot: usize) -> u64 {
        self.tasks
            .get(slot)
            .and_then(Option::as_ref)
            .map_or(0, |e| e.runs)
    }

    /// Number of active (enabled) tasks.
    pub fn active_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.as_ref().is_some_and(|e| e.task.enabled))
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
