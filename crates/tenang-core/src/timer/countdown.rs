//! Countdown engine.
//!
//! Counts whole seconds down to zero. The engine owns no timer of its own;
//! the session controller calls `tick()` once per second while the session
//! is running and not paused.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Completed
//!   ^________________ reset ____________________|
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;

/// Snapshot of the countdown.
///
/// A paused session keeps `is_running = true`; only completion and reset
/// clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub total_duration_seconds: u64,
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub is_paused: bool,
}

impl TimerState {
    fn idle(duration_seconds: u64) -> Self {
        Self {
            total_duration_seconds: duration_seconds,
            remaining_seconds: duration_seconds,
            is_running: false,
            is_paused: false,
        }
    }

    /// Running and not paused.
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_paused
    }

    /// Reached zero and stopped.
    pub fn is_complete(&self) -> bool {
        !self.is_running && self.remaining_seconds == 0
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.total_duration_seconds
            .saturating_sub(self.remaining_seconds)
    }

    /// 0.0 .. 100.0 progress across the session.
    pub fn progress_pct(&self) -> f64 {
        if self.total_duration_seconds == 0 {
            return 0.0;
        }
        (self.elapsed_seconds() as f64 / self.total_duration_seconds as f64 * 100.0).min(100.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEngine {
    state: TimerState,
}

impl CountdownEngine {
    /// Create an idle engine holding `duration_seconds`.
    pub fn new(duration_seconds: u64) -> Result<Self, ValidationError> {
        validate_duration(duration_seconds)?;
        Ok(Self {
            state: TimerState::idle(duration_seconds),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn total_duration_seconds(&self) -> u64 {
        self.state.total_duration_seconds
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session of `duration_seconds`. Zero is rejected and leaves
    /// the engine untouched.
    pub fn start(&mut self, duration_seconds: u64) -> Result<Event, ValidationError> {
        validate_duration(duration_seconds)?;
        self.state = TimerState {
            total_duration_seconds: duration_seconds,
            remaining_seconds: duration_seconds,
            is_running: true,
            is_paused: false,
        };
        Ok(Event::SessionStarted {
            duration_secs: duration_seconds,
            at: Utc::now(),
        })
    }

    /// No-op unless the session is ticking.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_ticking() {
            return None;
        }
        self.state.is_paused = true;
        Some(Event::SessionPaused {
            remaining_secs: self.state.remaining_seconds,
            at: Utc::now(),
        })
    }

    /// No-op unless the session is paused.
    pub fn resume(&mut self) -> Option<Event> {
        if !(self.state.is_running && self.state.is_paused) {
            return None;
        }
        self.state.is_paused = false;
        Some(Event::SessionResumed {
            remaining_secs: self.state.remaining_seconds,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self, duration_seconds: u64) -> Result<Event, ValidationError> {
        validate_duration(duration_seconds)?;
        self.state = TimerState::idle(duration_seconds);
        Ok(Event::SessionReset {
            duration_secs: duration_seconds,
            at: Utc::now(),
        })
    }

    /// Change the configured length of a session that is not running.
    pub fn set_duration(&mut self, duration_seconds: u64) -> Result<Event, ValidationError> {
        validate_duration(duration_seconds)?;
        if self.state.is_running {
            return Err(ValidationError::AdjustWhileRunning);
        }
        self.state = TimerState::idle(duration_seconds);
        Ok(Event::DurationAdjusted {
            duration_secs: duration_seconds,
            at: Utc::now(),
        })
    }

    /// One second elapsed. Returns `Progress`, followed by
    /// `SessionCompleted` when this tick reaches zero. Returns nothing when
    /// the session is not ticking.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.state.is_ticking() {
            return Vec::new();
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);

        let mut events = vec![Event::Progress {
            remaining_secs: self.state.remaining_seconds,
            progress_pct: self.state.progress_pct(),
            at: Utc::now(),
        }];
        if self.state.remaining_seconds == 0 {
            self.state.is_running = false;
            self.state.is_paused = false;
            events.push(Event::SessionCompleted {
                duration_secs: self.state.total_duration_seconds,
                at: Utc::now(),
            });
        }
        events
    }
}

fn validate_duration(duration_seconds: u64) -> Result<(), ValidationError> {
    if duration_seconds == 0 {
        return Err(ValidationError::InvalidDuration {
            seconds: duration_seconds,
        });
    }
    Ok(())
}

/// Format whole seconds as `mm:ss`. Minutes are not wrapped at 60.
pub fn format_mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn running(duration: u64) -> CountdownEngine {
        let mut engine = CountdownEngine::new(duration).unwrap();
        engine.start(duration).unwrap();
        engine
    }

    #[test]
    fn start_sets_running_state() {
        let engine = running(600);
        let s = engine.state();
        assert_eq!(s.remaining_seconds, 600);
        assert_eq!(s.total_duration_seconds, 600);
        assert!(s.is_running);
        assert!(!s.is_paused);
    }

    #[test]
    fn start_rejects_zero_duration() {
        let mut engine = CountdownEngine::new(60).unwrap();
        let err = engine.start(0).unwrap_err();
        assert_eq!(err, ValidationError::InvalidDuration { seconds: 0 });
        assert!(!engine.state().is_running);
        assert_eq!(engine.remaining_seconds(), 60);
    }

    #[test]
    fn pause_is_noop_when_idle() {
        let mut engine = CountdownEngine::new(60).unwrap();
        assert!(engine.pause().is_none());
        assert!(!engine.state().is_paused);
    }

    #[test]
    fn pause_twice_equals_pause_once() {
        let mut engine = running(60);
        engine.tick();
        assert!(engine.pause().is_some());
        let after_first = engine.state();
        assert!(engine.pause().is_none());
        assert_eq!(engine.state(), after_first);
    }

    #[test]
    fn resume_twice_equals_resume_once() {
        let mut engine = running(60);
        engine.pause();
        assert!(engine.resume().is_some());
        let after_first = engine.state();
        assert!(engine.resume().is_none());
        assert_eq!(engine.state(), after_first);
    }

    #[test]
    fn resume_is_noop_when_not_paused() {
        let mut engine = running(60);
        assert!(engine.resume().is_none());
    }

    #[test]
    fn tick_is_ignored_while_paused() {
        let mut engine = running(10);
        engine.pause();
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_seconds(), 10);
    }

    #[test]
    fn progress_precedes_completion() {
        let mut engine = running(1);
        let events = engine.tick();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Event::Progress {
                remaining_secs: 0,
                ..
            }
        ));
        assert!(matches!(
            events[1],
            Event::SessionCompleted {
                duration_secs: 1,
                ..
            }
        ));
        assert!(engine.state().is_complete());
    }

    #[test]
    fn no_ticks_after_completion() {
        let mut engine = running(2);
        engine.tick();
        engine.tick();
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_seconds(), 0);
    }

    #[test]
    fn reset_restores_idle() {
        let mut engine = running(60);
        engine.tick();
        engine.pause();
        engine.reset(300).unwrap();
        let s = engine.state();
        assert_eq!(s.remaining_seconds, 300);
        assert_eq!(s.total_duration_seconds, 300);
        assert!(!s.is_running);
        assert!(!s.is_paused);
    }

    #[test]
    fn set_duration_rejected_while_running() {
        let mut engine = running(60);
        engine.pause();
        assert_eq!(
            engine.set_duration(120).unwrap_err(),
            ValidationError::AdjustWhileRunning
        );
    }

    #[test]
    fn set_duration_updates_remaining_when_idle() {
        let mut engine = CountdownEngine::new(60).unwrap();
        engine.set_duration(900).unwrap();
        assert_eq!(engine.remaining_seconds(), 900);
        assert_eq!(engine.total_duration_seconds(), 900);
    }

    #[test]
    fn progress_pct_tracks_elapsed() {
        let mut engine = running(4);
        engine.tick();
        assert!((engine.state().progress_pct() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(59), "00:59");
        assert_eq!(format_mm_ss(600), "10:00");
        assert_eq!(format_mm_ss(4500), "75:00");
    }

    proptest! {
        #[test]
        fn remaining_is_monotonic_and_hits_zero(duration in 1u64..2_000) {
            let mut engine = running(duration);
            let mut previous = engine.remaining_seconds();
            let mut completions = 0;
            for _ in 0..duration + 5 {
                for event in engine.tick() {
                    if event.is_completion() {
                        completions += 1;
                    }
                }
                let now = engine.remaining_seconds();
                prop_assert!(now <= previous);
                previous = now;
            }
            prop_assert_eq!(engine.remaining_seconds(), 0);
            prop_assert_eq!(completions, 1);
        }
    }
}
