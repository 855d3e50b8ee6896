use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::BreathPattern;

/// Session lengths offered to the user, in minutes.
pub const DEFAULT_PRESETS_MIN: [u64; 7] = [5, 10, 15, 20, 30, 45, 60];

pub const DEFAULT_DURATION_SECS: u64 = 10 * 60;

/// Direction for the `+` / `-` duration shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetStep {
    Longer,
    Shorter,
}

/// Everything a controller needs to know before the first session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub default_duration_secs: u64,
    /// Sorted, de-duplicated, all positive once validated.
    pub presets_min: Vec<u64>,
    pub breathing_guide: bool,
    pub pattern: BreathPattern,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_duration_secs: DEFAULT_DURATION_SECS,
            presets_min: DEFAULT_PRESETS_MIN.to_vec(),
            breathing_guide: true,
            pattern: BreathPattern::default(),
        }
    }
}

impl SessionSettings {
    /// Normalize presets and check every value.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if self.default_duration_secs == 0 {
            return Err(ValidationError::InvalidDuration { seconds: 0 });
        }
        self.presets_min.sort_unstable();
        self.presets_min.dedup();
        if self.presets_min.is_empty() {
            return Err(ValidationError::EmptyCollection("presets".into()));
        }
        if self.presets_min[0] == 0 {
            return Err(ValidationError::InvalidValue {
                field: "presets".into(),
                message: "preset durations must be at least one minute".into(),
            });
        }
        self.pattern.validate()?;
        Ok(self)
    }

    /// Preset adjacent to `current_secs` in the given direction, in seconds.
    /// `None` at either end of the list.
    pub fn step_preset(&self, current_secs: u64, step: PresetStep) -> Option<u64> {
        let mut secs = self.presets_min.iter().map(|m| m.saturating_mul(60));
        match step {
            PresetStep::Longer => secs.find(|s| *s > current_secs),
            PresetStep::Shorter => secs.rev().find(|s| *s < current_secs),
        }
    }
}
