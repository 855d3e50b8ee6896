//! # Tenang Core Library
//!
//! This library provides the core of the Tenang meditation timer: a
//! countdown with an optional 4-7-8 breathing guide. The CLI and any GUI
//! are thin layers over the same controller.
//!
//! ## Architecture
//!
//! - **Timer**: the countdown engine, the breathing phase cycle and the
//!   virtual clock (timer queue) both are scheduled on
//! - **Session**: the controller that owns both state machines and every
//!   timer, and cancels them on pause, reset, completion and teardown
//! - **Runner**: a tokio task driving a controller in real time
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: deterministic session state machine
//! - [`SessionRunner`]: real-time driver with command/event channels
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod runner;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ClockError, ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use runner::SessionRunner;
pub use session::{Command, PresetStep, SessionController, SessionSettings, Shortcut};
pub use storage::Config;
pub use timer::{format_mm_ss, BreathPattern, BreathPhase, BreathingState, TimerState};
