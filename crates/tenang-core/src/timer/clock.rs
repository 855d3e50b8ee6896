//! Virtual clock source.
//!
//! The queue holds one-shot timers against a millisecond clock that only
//! moves when the owner advances it. Timers due at the same instant fire in
//! the order they were scheduled, which makes a session fully reproducible
//! in tests and simulations. Recurring ticks are expressed by rescheduling
//! from inside the handler.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ClockError;

/// Opaque handle to a scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a timer is for. The owner dispatches on this when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Recurring 1-second countdown tick.
    CountdownTick,
    /// One-shot end of the current breathing phase.
    BreathPhase,
}

/// A timer popped from the queue because its deadline was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    pub handle: TimerHandle,
    pub kind: TimerKind,
    pub deadline_ms: u64,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_id: u64,
    /// Ordered by (deadline, handle); handles grow monotonically so ties
    /// resolve in scheduling order.
    pending: BTreeMap<(u64, TimerHandle), TimerKind>,
    deadlines: HashMap<TimerHandle, u64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds since the queue was created.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Schedule a one-shot timer `delay_ms` after the current time.
    pub fn schedule(&mut self, delay_ms: u64, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let deadline = self.now_ms.saturating_add(delay_ms);
        self.pending.insert((deadline, handle), kind);
        self.deadlines.insert(handle, deadline);
        handle
    }

    /// Cancel a pending timer.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::UnknownTimer`] if the handle already fired, was
    /// already cancelled, or never belonged to this queue.
    pub fn cancel(&mut self, handle: TimerHandle) -> Result<(), ClockError> {
        let deadline = self
            .deadlines
            .remove(&handle)
            .ok_or(ClockError::UnknownTimer(handle))?;
        self.pending.remove(&(deadline, handle));
        Ok(())
    }

    /// Cancel everything. Returns how many timers were pending.
    pub fn clear(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        self.deadlines.clear();
        count
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock
    /// to its deadline.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<DueTimer> {
        let (&(deadline, handle), _) = self.pending.iter().next()?;
        if deadline > until_ms {
            return None;
        }
        let kind = self.pending.remove(&(deadline, handle))?;
        self.deadlines.remove(&handle);
        self.now_ms = self.now_ms.max(deadline);
        Some(DueTimer {
            handle,
            kind,
            deadline_ms: deadline,
        })
    }

    /// Move the clock forward. The clock never goes backwards.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_deadline_order() {
        let mut q = TimerQueue::new();
        let late = q.schedule(2_000, TimerKind::BreathPhase);
        let early = q.schedule(1_000, TimerKind::CountdownTick);

        let first = q.pop_due(5_000).unwrap();
        assert_eq!(first.handle, early);
        assert_eq!(q.now_ms(), 1_000);

        let second = q.pop_due(5_000).unwrap();
        assert_eq!(second.handle, late);
        assert_eq!(second.kind, TimerKind::BreathPhase);
        assert!(q.pop_due(5_000).is_none());
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        let a = q.schedule(1_000, TimerKind::BreathPhase);
        let b = q.schedule(1_000, TimerKind::CountdownTick);
        assert_eq!(q.pop_due(1_000).unwrap().handle, a);
        assert_eq!(q.pop_due(1_000).unwrap().handle, b);
    }

    #[test]
    fn nothing_fires_before_deadline() {
        let mut q = TimerQueue::new();
        q.schedule(1_000, TimerKind::CountdownTick);
        assert!(q.pop_due(999).is_none());
        assert_eq!(q.next_deadline(), Some(1_000));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let h = q.schedule(1_000, TimerKind::BreathPhase);
        q.cancel(h).unwrap();
        assert!(q.is_empty());
        assert!(q.pop_due(10_000).is_none());
    }

    #[test]
    fn cancelling_twice_is_an_error() {
        let mut q = TimerQueue::new();
        let h = q.schedule(1_000, TimerKind::BreathPhase);
        q.cancel(h).unwrap();
        assert_eq!(q.cancel(h), Err(ClockError::UnknownTimer(h)));
    }

    #[test]
    fn cancelling_a_fired_timer_is_an_error() {
        let mut q = TimerQueue::new();
        let h = q.schedule(10, TimerKind::CountdownTick);
        q.pop_due(10).unwrap();
        assert!(q.cancel(h).is_err());
    }

    #[test]
    fn schedule_is_relative_to_now() {
        let mut q = TimerQueue::new();
        q.set_now(5_000);
        q.schedule(1_000, TimerKind::CountdownTick);
        assert_eq!(q.next_deadline(), Some(6_000));
    }

    #[test]
    fn clock_is_monotonic() {
        let mut q = TimerQueue::new();
        q.set_now(3_000);
        q.set_now(1_000);
        assert_eq!(q.now_ms(), 3_000);
    }

    #[test]
    fn clear_reports_pending_count() {
        let mut q = TimerQueue::new();
        q.schedule(1, TimerKind::CountdownTick);
        q.schedule(2, TimerKind::BreathPhase);
        assert_eq!(q.clear(), 2);
        assert!(q.next_deadline().is_none());
    }
}
