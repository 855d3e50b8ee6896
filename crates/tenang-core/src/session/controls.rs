//! User actions and their keyboard shortcuts.
//!
//! Shortcuts are a pure mapping onto [`Command`]; they hold no state.

use serde::{Deserialize, Serialize};

use super::settings::PresetStep;

/// An action a user (or a program) can request from a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Start { duration_secs: u64 },
    /// Start when idle, pause when ticking, resume when paused.
    TogglePause,
    Pause,
    Resume,
    /// Reset to the configured duration.
    Reset,
    AdjustDuration { duration_secs: u64 },
    StepPreset { step: PresetStep },
    SetBreathingGuide { enabled: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    TogglePause,
    Reset,
    Longer,
    Shorter,
}

impl Shortcut {
    /// space = pause/resume, r = reset, +/- = duration.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            ' ' => Some(Shortcut::TogglePause),
            'r' | 'R' => Some(Shortcut::Reset),
            // '=' shares the '+' key on most layouts
            '+' | '=' => Some(Shortcut::Longer),
            '-' | '_' => Some(Shortcut::Shorter),
            _ => None,
        }
    }

    pub fn command(self) -> Command {
        match self {
            Shortcut::TogglePause => Command::TogglePause,
            Shortcut::Reset => Command::Reset,
            Shortcut::Longer => Command::StepPreset {
                step: PresetStep::Longer,
            },
            Shortcut::Shorter => Command::StepPreset {
                step: PresetStep::Shorter,
            },
        }
    }
}
