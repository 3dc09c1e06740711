//! Cooperative timer scheduler for the single-threaded event loop
//!
//! The loop asks for the next deadline, sleeps or polls until then, and
//! collects due tasks with [`Scheduler::take_due`]. Nothing runs on its own.
use std::time::{Duration, Instant};

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Task {
    id: TaskId,
    deadline: Instant,
    /// `None` for one-shot tasks
    period: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every `period`, first one period after `now`
    pub fn schedule_repeating(&mut self, period: Duration, now: Instant) -> TaskId {
        self.insert(now + period, Some(period))
    }

    /// Run once, `delay` after `now`
    pub fn schedule_once(&mut self, delay: Duration, now: Instant) -> TaskId {
        self.insert(now + delay, None)
    }

    fn insert(&mut self, deadline: Instant, period: Option<Duration>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            deadline,
            period,
        });
        id
    }

    /// Remove a task. Returns false if it was not scheduled (already fired
    /// once-only, or cancelled before).
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|task| task.deadline).min()
    }

    /// Collect every task due at `now`, earliest deadline first.
    ///
    /// One-shot tasks are removed. Repeating tasks fire once even if several
    /// periods were missed, and are rescheduled from their deadline, or from
    /// `now` when they fell a full period behind.
    pub fn take_due(&mut self, now: Instant) -> Vec<TaskId> {
        let mut due: Vec<(Instant, TaskId)> = self
            .tasks
            .iter()
            .filter(|task| task.deadline <= now)
            .map(|task| (task.deadline, task.id))
            .collect();
        due.sort();

        self.tasks.retain_mut(|task| {
            if task.deadline > now {
                return true;
            }
            match task.period {
                Some(period) => {
                    let next = task.deadline + period;
                    task.deadline = if next <= now { now + period } else { next };
                    true
                }
                None => false,
            }
        });

        due.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_nothing_due_before_deadline() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(ms(40), t0);

        assert!(scheduler.take_due(t0 + ms(39)).is_empty());
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(40)));
    }

    #[test]
    fn test_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let slow = scheduler.schedule_once(ms(30), t0);
        let fast = scheduler.schedule_once(ms(10), t0);
        let mid = scheduler.schedule_repeating(ms(20), t0);

        assert_eq!(scheduler.take_due(t0 + ms(30)), vec![fast, mid, slow]);
    }

    #[test]
    fn test_once_fires_once() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let close = scheduler.schedule_once(ms(2000), t0);

        assert_eq!(scheduler.take_due(t0 + ms(2000)), vec![close]);
        assert!(!scheduler.is_scheduled(close));
        assert!(scheduler.take_due(t0 + ms(5000)).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_repeating_keeps_cadence() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let tick = scheduler.schedule_repeating(ms(40), t0);

        // A little late: next deadline stays on the original grid
        assert_eq!(scheduler.take_due(t0 + ms(45)), vec![tick]);
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(80)));
    }

    #[test]
    fn test_missed_ticks_coalesce() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let tick = scheduler.schedule_repeating(ms(40), t0);

        assert_eq!(scheduler.take_due(t0 + ms(500)), vec![tick]);
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(540)));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let tick = scheduler.schedule_repeating(ms(40), t0);
        let watch = scheduler.schedule_repeating(ms(1000), t0);

        assert!(scheduler.cancel(tick));
        assert!(!scheduler.cancel(tick));
        assert_eq!(scheduler.take_due(t0 + ms(1000)), vec![watch]);
    }

    #[test]
    fn test_ids_are_unique() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let a = scheduler.schedule_once(ms(1), t0);
        scheduler.cancel(a);
        let b = scheduler.schedule_once(ms(1), t0);
        assert_ne!(a, b);
    }
}
