//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default session length and the preset list offered by `+`/`-`
//! - Whether the breathing guide is on by default
//! - Breathing phase durations
//! - Display preferences
//!
//! Configuration is stored at `~/.config/tenang/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::session::{SessionSettings, DEFAULT_PRESETS_MIN};
use crate::timer::BreathPattern;

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_minutes")]
    pub default_minutes: u64,
    #[serde(default = "default_presets")]
    pub presets: Vec<u64>,
    #[serde(default = "default_true")]
    pub breathing_guide: bool,
}

/// Breathing phase durations in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathingConfig {
    #[serde(default = "default_inhale")]
    pub inhale_secs: u64,
    #[serde(default = "default_hold")]
    pub hold_secs: u64,
    #[serde(default = "default_exhale")]
    pub exhale_secs: u64,
    #[serde(default = "default_pause")]
    pub pause_secs: u64,
}

/// Display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub show_instructions: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tenang/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub breathing: BreathingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

// Default functions
fn default_minutes() -> u64 {
    10
}
fn default_presets() -> Vec<u64> {
    DEFAULT_PRESETS_MIN.to_vec()
}
fn default_true() -> bool {
    true
}
fn default_inhale() -> u64 {
    4
}
fn default_hold() -> u64 {
    7
}
fn default_exhale() -> u64 {
    8
}
fn default_pause() -> u64 {
    1
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            presets: default_presets(),
            breathing_guide: true,
        }
    }
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            inhale_secs: default_inhale(),
            hold_secs: default_hold(),
            exhale_secs: default_exhale(),
            pause_secs: default_pause(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_instructions: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|e| invalid(e.to_string()))?,
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file does
    /// not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Ok(Self::load_from(&Self::path()?)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), CoreError> {
        Ok(self.save_to(&Self::path()?)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn breath_pattern(&self) -> BreathPattern {
        BreathPattern {
            inhale_secs: self.breathing.inhale_secs,
            hold_secs: self.breathing.hold_secs,
            exhale_secs: self.breathing.exhale_secs,
            pause_secs: self.breathing.pause_secs,
        }
    }

    /// Validated controller settings.
    pub fn session_settings(&self) -> Result<SessionSettings, CoreError> {
        let settings = SessionSettings {
            default_duration_secs: self.session.default_minutes.saturating_mul(60),
            presets_min: self.session.presets.clone(),
            breathing_guide: self.session.breathing_guide,
            pattern: self.breath_pattern(),
        };
        Ok(settings.validated()?)
    }
}
