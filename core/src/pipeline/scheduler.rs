//! Timer seam for the pipeline. The simulator never sleeps; it asks a
//! [`Scheduler`] for a wake-up and is handed a [`FiredTimer`] by whoever
//! drives the queue (a real event loop, or a test stepping virtual time).

use crate::determinism::ids::RunToken;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub run: RunToken,
    pub due: Duration,
}

pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, run: RunToken) -> TimerId;
    fn cancel(&mut self, id: TimerId) -> bool;
}

/// Virtual-time timer queue. `now` starts at zero and only moves when the
/// driver pops timers or advances it.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    // keyed by (deadline, id) so equal deadlines fire in scheduling order
    pending: BTreeMap<(Duration, TimerId), RunToken>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Pops the earliest timer whose deadline is at or before `until`,
    /// moving `now` to that deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer> {
        let key = *self.pending.keys().next()?;
        if key.0 > until {
            return None;
        }
        let run = self.pending.remove(&key)?;
        self.now = key.0;
        Some(FiredTimer {
            id: key.1,
            run,
            due: key.0,
        })
    }

    /// Pops the earliest timer regardless of deadline.
    pub fn pop_next(&mut self) -> Option<FiredTimer> {
        let due = self.next_due()?;
        self.pop_due(due)
    }

    /// Moves time forward without firing anything; pair with [`TimerQueue::pop_due`]
    /// when the driver wants timers scheduled during the step to fire too.
    pub fn advance_to(&mut self, at: Duration) {
        if at > self.now {
            self.now = at;
        }
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, run: RunToken) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert((self.now + delay, id), run);
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.pending.keys().find(|(_, tid)| *tid == id).copied();
        match key {
            Some(k) => self.pending.remove(&k).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut q = TimerQueue::new();
        let run = RunToken::fresh();
        let late = q.schedule(Duration::from_millis(20), run.clone());
        let early = q.schedule(Duration::from_millis(10), run.clone());

        assert!(q.pop_due(Duration::from_millis(5)).is_none());
        let first = q.pop_due(Duration::from_millis(30)).unwrap();
        assert_eq!(first.id, early);
        assert_eq!(q.now(), Duration::from_millis(10));
        let second = q.pop_next().unwrap();
        assert_eq!(second.id, late);
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let id = q.schedule(Duration::from_millis(1), RunToken::fresh());
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert!(q.pop_next().is_none());
    }

    #[test]
    fn delays_are_relative_to_current_time() {
        let mut q = TimerQueue::new();
        q.advance_to(Duration::from_millis(100));
        q.schedule(Duration::from_millis(5), RunToken::fresh());
        assert_eq!(q.next_due(), Some(Duration::from_millis(105)));
    }
}
