//! Event output: one line per event, as text or JSON.

use std::io::Write;

use tenang_core::{format_mm_ss, Event};

pub struct Printer {
    pub json: bool,
    pub show_instructions: bool,
}

impl Printer {
    /// Print one event. `clock_ms` is the session clock, shown when known.
    pub fn print(&self, clock_ms: Option<u64>, event: &Event) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        if self.json {
            let line = match clock_ms {
                Some(clock_ms) => serde_json::json!({ "clock_ms": clock_ms, "event": event }),
                None => serde_json::json!(event),
            };
            return writeln!(out, "{line}");
        }

        let text = self.describe(event);
        match clock_ms {
            Some(ms) => writeln!(out, "[{}] {text}", format_mm_ss(ms / 1000)),
            None => writeln!(out, "{text}"),
        }
    }

    pub fn print_all(&self, clock_ms: Option<u64>, events: &[Event]) -> std::io::Result<()> {
        for event in events {
            self.print(clock_ms, event)?;
        }
        Ok(())
    }

    fn describe(&self, event: &Event) -> String {
        match event {
            Event::SessionStarted { duration_secs, .. } => {
                format!("session started: {}", format_mm_ss(*duration_secs))
            }
            Event::SessionPaused { remaining_secs, .. } => {
                format!("paused at {}", format_mm_ss(*remaining_secs))
            }
            Event::SessionResumed { remaining_secs, .. } => {
                format!("resumed at {}", format_mm_ss(*remaining_secs))
            }
            Event::Progress {
                remaining_secs,
                progress_pct,
                ..
            } => format!("{}  {progress_pct:5.1}%", format_mm_ss(*remaining_secs)),
            Event::SessionCompleted { duration_secs, .. } => {
                format!("session complete ({})", format_mm_ss(*duration_secs))
            }
            Event::SessionReset { duration_secs, .. } => {
                format!("reset to {}", format_mm_ss(*duration_secs))
            }
            Event::DurationAdjusted { duration_secs, .. } => {
                format!("duration set to {}", format_mm_ss(*duration_secs))
            }
            Event::BreathingGuideToggled { enabled, .. } => format!(
                "breathing guide {} (from next start)",
                if *enabled { "on" } else { "off" }
            ),
            Event::PhaseChanged {
                phase, instruction, ..
            } => {
                if self.show_instructions {
                    format!("  ~ {instruction} ({phase})")
                } else {
                    format!("  ~ {phase}")
                }
            }
            Event::BreathCompleted { cycle_count, .. } => format!("  breaths: {cycle_count}"),
            Event::StateSnapshot {
                display,
                progress_pct,
                ..
            } => format!("{display}  {progress_pct:5.1}%"),
        }
    }
}
