//! Deferred wall-clock tasks owned by a run
//!
//! Countdown steps, scripted-event delays and staggered spawns are queued
//! here with an absolute due time and the id of the run that queued them.
//! Tasks follow the wall clock, not simulation time, so they keep firing
//! while paused or slowed. Starting a new run or returning to idle cancels
//! every task of the old run.

use serde::{Deserialize, Serialize};

use super::events::SpecialEventKind;

/// What a deferred task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskAction {
    /// Show countdown step `n` (0 is "GO")
    Countdown(u8),
    /// Countdown finished: start the clock
    BeginPlay,
    /// Post-death summary
    ShowResults,
    /// Warning elapsed: run the scripted pattern
    ExecuteEvent(SpecialEventKind),
    /// One regular spawn from a wave event
    SpawnObstacle,
    /// One fast obstacle dropped from the top edge
    SpawnRainDrop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub run_id: u64,
    /// Wall-clock time (ms) at which the task fires
    pub due_ms: f64,
    pub action: TaskAction,
    seq: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, run_id: u64, due_ms: f64, action: TaskAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(ScheduledTask {
            run_id,
            due_ms,
            action,
            seq,
        });
    }

    /// Remove and return every task of `run_id` due at `now_ms`, ordered by
    /// due time then by scheduling order. Tasks of other runs that are due
    /// are discarded.
    pub fn take_due(&mut self, run_id: u64, now_ms: f64) -> Vec<ScheduledTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| t.due_ms <= now_ms);
        self.tasks = pending;

        let before = due.len();
        due.retain(|t| t.run_id == run_id);
        if due.len() != before {
            log::warn!("Dropped {} stale task(s) from a previous run", before - due.len());
        }

        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due
    }

    /// Cancel every pending task of a run. Returns how many were dropped.
    pub fn cancel_run(&mut self, run_id: u64) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.run_id != run_id);
        before - self.tasks.len()
    }

    pub fn pending(&self, run_id: u64) -> usize {
        self.tasks.iter().filter(|t| t.run_id == run_id).count()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_due_orders_and_keeps_future() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1, 200.0, TaskAction::SpawnRainDrop);
        scheduler.schedule(1, 100.0, TaskAction::SpawnObstacle);
        scheduler.schedule(1, 100.0, TaskAction::BeginPlay);
        scheduler.schedule(1, 500.0, TaskAction::ShowResults);

        let due = scheduler.take_due(1, 250.0);
        let actions: Vec<_> = due.iter().map(|t| t.action).collect();
        assert_eq!(
            actions,
            vec![TaskAction::SpawnObstacle, TaskAction::BeginPlay, TaskAction::SpawnRainDrop]
        );
        assert_eq!(scheduler.pending(1), 1);
    }

    #[test]
    fn test_cancel_run_only_touches_that_run() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1, 100.0, TaskAction::SpawnObstacle);
        scheduler.schedule(1, 900.0, TaskAction::SpawnObstacle);
        scheduler.schedule(2, 100.0, TaskAction::Countdown(3));
        assert_eq!(scheduler.cancel_run(1), 2);
        assert_eq!(scheduler.pending(1), 0);
        assert_eq!(scheduler.pending(2), 1);
    }

    #[test]
    fn test_stale_tasks_never_fire() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1, 100.0, TaskAction::SpawnObstacle);
        scheduler.schedule(2, 100.0, TaskAction::Countdown(3));
        let due = scheduler.take_due(2, 1000.0);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].action, TaskAction::Countdown(3));
        assert!(scheduler.is_empty());
    }
}
