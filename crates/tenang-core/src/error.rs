//! Core error types for tenang-core.
//!
//! Precondition violations are rejected with [`ValidationError`]. Redundant
//! actions such as pausing twice are not errors and never show up here.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerHandle;

/// Core error type for tenang-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Timer bookkeeping went wrong. A leaked or unknown timer corrupts
    /// later session state, so callers treat this as fatal.
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    /// The background session runner is gone or refused a command
    #[error("Session runner error: {0}")]
    Runner(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Session length must be a positive number of seconds
    #[error("Invalid duration: {seconds}s (must be greater than zero)")]
    InvalidDuration { seconds: u64 },

    /// Duration changes are only accepted while no session is active
    #[error("Cannot adjust duration while a session is running")]
    AdjustWhileRunning,

    /// Every breathing phase needs a positive duration
    #[error("Invalid breathing pattern: {phase} duration must be greater than zero")]
    InvalidPattern { phase: String },

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised by the timer queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// Cancelling a handle that is not pending (already fired or never scheduled)
    #[error("timer {0} is not pending")]
    UnknownTimer(TimerHandle),

    /// A timer fired that no component had armed
    #[error("timer {0} fired but nothing was waiting for it")]
    StrayTimer(TimerHandle),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
