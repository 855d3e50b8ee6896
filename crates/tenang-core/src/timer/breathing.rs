//! Breathing phase cycle.
//!
//! Four phases in strict order, each held for its own duration:
//!
//! ```text
//! Inhale -> Hold -> Exhale -> Pause -> Inhale -> ...
//! ```
//!
//! The cycle does not schedule anything itself. The session controller asks
//! [`BreathingCycle::arm`] how long to wait, schedules a one-shot timer on
//! the clock, and calls [`BreathingCycle::advance`] when it fires. Pausing
//! goes through [`BreathingCycle::suspend`] so the unfinished part of the
//! phase is kept for the next `arm`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
    Pause,
}

impl BreathPhase {
    pub const ALL: [BreathPhase; 4] = [
        BreathPhase::Inhale,
        BreathPhase::Hold,
        BreathPhase::Exhale,
        BreathPhase::Pause,
    ];

    pub fn next(self) -> Self {
        match self {
            BreathPhase::Inhale => BreathPhase::Hold,
            BreathPhase::Hold => BreathPhase::Exhale,
            BreathPhase::Exhale => BreathPhase::Pause,
            BreathPhase::Pause => BreathPhase::Inhale,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BreathPhase::Inhale => "inhale",
            BreathPhase::Hold => "hold",
            BreathPhase::Exhale => "exhale",
            BreathPhase::Pause => "pause",
        }
    }

    /// Guidance shown to the user during the phase.
    pub fn instruction(self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Tarik napas",
            BreathPhase::Hold => "Tahan",
            BreathPhase::Exhale => "Hembuskan",
            BreathPhase::Pause => "Jeda",
        }
    }
}

impl fmt::Display for BreathPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase lengths in seconds. Defaults to the 4-7-8 technique with a
/// one-second rest, a 20-second breath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathPattern {
    pub inhale_secs: u64,
    pub hold_secs: u64,
    pub exhale_secs: u64,
    pub pause_secs: u64,
}

impl BreathPattern {
    pub fn new(
        inhale_secs: u64,
        hold_secs: u64,
        exhale_secs: u64,
        pause_secs: u64,
    ) -> Result<Self, ValidationError> {
        let pattern = Self {
            inhale_secs,
            hold_secs,
            exhale_secs,
            pause_secs,
        };
        pattern.validate()?;
        Ok(pattern)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for phase in BreathPhase::ALL {
            if self.duration_secs(phase) == 0 {
                return Err(ValidationError::InvalidPattern {
                    phase: phase.label().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn duration_secs(&self, phase: BreathPhase) -> u64 {
        match phase {
            BreathPhase::Inhale => self.inhale_secs,
            BreathPhase::Hold => self.hold_secs,
            BreathPhase::Exhale => self.exhale_secs,
            BreathPhase::Pause => self.pause_secs,
        }
    }

    pub fn duration_ms(&self, phase: BreathPhase) -> u64 {
        self.duration_secs(phase).saturating_mul(1000)
    }

    /// Length of one full breath.
    pub fn cycle_secs(&self) -> u64 {
        BreathPhase::ALL
            .iter()
            .map(|p| self.duration_secs(*p))
            .sum()
    }
}

impl Default for BreathPattern {
    fn default() -> Self {
        Self {
            inhale_secs: 4,
            hold_secs: 7,
            exhale_secs: 8,
            pause_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingState {
    pub phase: BreathPhase,
    pub cycle_count: u64,
}

impl Default for BreathingState {
    fn default() -> Self {
        Self {
            phase: BreathPhase::Inhale,
            cycle_count: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreathingCycle {
    pattern: BreathPattern,
    state: BreathingState,
    /// Unfinished part of the current phase.
    phase_remaining_ms: u64,
    /// Clock time of the last `arm`, cleared by `suspend`.
    armed_at_ms: Option<u64>,
}

impl BreathingCycle {
    pub fn new(pattern: BreathPattern) -> Self {
        Self {
            pattern,
            state: BreathingState::default(),
            phase_remaining_ms: pattern.duration_ms(BreathPhase::Inhale),
            armed_at_ms: None,
        }
    }

    pub fn state(&self) -> BreathingState {
        self.state
    }

    pub fn phase(&self) -> BreathPhase {
        self.state.phase
    }

    pub fn cycle_count(&self) -> u64 {
        self.state.cycle_count
    }

    pub fn phase_remaining_ms(&self) -> u64 {
        self.phase_remaining_ms
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at_ms.is_some()
    }

    /// Event describing the phase the cycle is currently in.
    pub fn current_phase_event(&self) -> Event {
        Event::PhaseChanged {
            phase: self.state.phase,
            instruction: self.state.phase.instruction().to_string(),
            cycle_count: self.state.cycle_count,
            at: Utc::now(),
        }
    }

    /// Mark the phase as running from `now_ms`. Returns the delay until the
    /// phase ends.
    pub fn arm(&mut self, now_ms: u64) -> u64 {
        self.armed_at_ms = Some(now_ms);
        self.phase_remaining_ms
    }

    /// Stop the running phase at `now_ms`, keeping what is left of it.
    pub fn suspend(&mut self, now_ms: u64) {
        if let Some(armed_at) = self.armed_at_ms.take() {
            let elapsed = now_ms.saturating_sub(armed_at);
            self.phase_remaining_ms = self.phase_remaining_ms.saturating_sub(elapsed);
        }
    }

    /// The current phase finished. Moves to the next phase and returns the
    /// resulting events: `BreathCompleted` when leaving exhale, then
    /// `PhaseChanged`. The cycle is left disarmed.
    pub fn advance(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(2);
        if self.state.phase == BreathPhase::Exhale {
            self.state.cycle_count += 1;
            events.push(Event::BreathCompleted {
                cycle_count: self.state.cycle_count,
                at: Utc::now(),
            });
        }
        self.state.phase = self.state.phase.next();
        self.phase_remaining_ms = self.pattern.duration_ms(self.state.phase);
        self.armed_at_ms = None;
        events.push(self.current_phase_event());
        events
    }

    /// Back to the start of inhale with no breaths counted.
    pub fn reset(&mut self) {
        self.state = BreathingState::default();
        self.phase_remaining_ms = self.pattern.duration_ms(BreathPhase::Inhale);
        self.armed_at_ms = None;
    }
}
