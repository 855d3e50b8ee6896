use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{BreathPhase, BreathingState, TimerState};

/// Every state change in a session produces an Event.
/// The CLI prints them; the runner broadcasts them to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Emitted on every countdown tick, including the one that reaches zero.
    Progress {
        remaining_secs: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
    /// Emitted exactly once per session, after the final `Progress`.
    SessionCompleted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    DurationAdjusted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// The flag only takes effect at the next start.
    BreathingGuideToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: BreathPhase,
        instruction: String,
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    /// One full breath taken (exhale finished).
    BreathCompleted {
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        timer: TimerState,
        breathing: Option<BreathingState>,
        breathing_guide: bool,
        display: String,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::SessionCompleted { .. })
    }
}
