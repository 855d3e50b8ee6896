mod config;

pub use config::{BreathingConfig, Config, DisplayConfig, SessionConfig};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/tenang[-dev]/` based on TENANG_ENV.
///
/// Set TENANG_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TENANG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tenang-dev")
    } else {
        base_dir.join("tenang")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
