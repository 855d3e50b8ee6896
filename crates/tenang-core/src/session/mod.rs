//! Session controller.
//!
//! Owns the countdown, the breathing cycle and every timer scheduled on
//! their behalf. The two state machines never look at each other's flags:
//! whenever the session stops ticking (pause, reset, completion, teardown)
//! the controller cancels both pending timers, and whenever it starts
//! ticking again it re-arms them.
//!
//! Time only moves through [`SessionController::advance_to`], so the same
//! controller runs under the real-time [`crate::runner::SessionRunner`] and
//! under deterministic simulations.

mod controls;
mod settings;

pub use controls::{Command, Shortcut};
pub use settings::{PresetStep, SessionSettings, DEFAULT_DURATION_SECS, DEFAULT_PRESETS_MIN};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{ClockError, CoreError, Result};
use crate::events::Event;
use crate::timer::{
    format_mm_ss, BreathingCycle, BreathingState, CountdownEngine, DueTimer, TimerHandle,
    TimerKind, TimerQueue, TimerState,
};

const TICK_MS: u64 = 1_000;

#[derive(Debug)]
pub struct SessionController {
    settings: SessionSettings,
    countdown: CountdownEngine,
    breathing: BreathingCycle,
    /// Requested guide mode, applied at the next start.
    breathing_guide: bool,
    /// Guide mode latched for the current session.
    guide_active: bool,
    clock: TimerQueue,
    tick_timer: Option<TimerHandle>,
    phase_timer: Option<TimerHandle>,
}

impl SessionController {
    pub fn new(settings: SessionSettings) -> Result<Self> {
        let settings = settings.validated()?;
        let countdown = CountdownEngine::new(settings.default_duration_secs)?;
        Ok(Self {
            breathing: BreathingCycle::new(settings.pattern),
            breathing_guide: settings.breathing_guide,
            guide_active: false,
            countdown,
            settings,
            clock: TimerQueue::new(),
            tick_timer: None,
            phase_timer: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> TimerState {
        self.countdown.state()
    }

    pub fn breathing_state(&self) -> BreathingState {
        self.breathing.state()
    }

    /// Guide mode requested for the next start.
    pub fn breathing_guide(&self) -> bool {
        self.breathing_guide
    }

    /// Guide mode of the session in progress (or last finished).
    pub fn guide_active(&self) -> bool {
        self.guide_active
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.clock.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.clock.len()
    }

    pub fn snapshot(&self) -> Event {
        let timer = self.countdown.state();
        Event::StateSnapshot {
            timer,
            breathing: self.guide_active.then(|| self.breathing.state()),
            breathing_guide: self.breathing_guide,
            display: format_mm_ss(timer.remaining_seconds),
            progress_pct: timer.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn apply(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::Start { duration_secs } => self.start(duration_secs),
            Command::TogglePause => self.toggle_pause(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Reset => self.reset(),
            Command::AdjustDuration { duration_secs } => self.adjust_duration(duration_secs),
            Command::StepPreset { step } => self.step_preset(step),
            Command::SetBreathingGuide { enabled } => {
                Ok(vec![self.toggle_breathing_guide(enabled)])
            }
        }
    }

    /// Start a session. Ignored while one is already running.
    pub fn start(&mut self, duration_secs: u64) -> Result<Vec<Event>> {
        if self.countdown.state().is_running {
            debug!("start ignored: session already running");
            return Ok(Vec::new());
        }
        let started = self.countdown.start(duration_secs).map_err(|e| {
            warn!(duration_secs, "rejected session start: {e}");
            e
        })?;
        self.cancel_timers()?;
        self.breathing.reset();
        self.guide_active = self.breathing_guide;

        let mut events = vec![started];
        self.arm_tick();
        if self.guide_active {
            events.push(self.breathing.current_phase_event());
            self.arm_phase();
        }
        info!(
            duration_secs,
            breathing_guide = self.guide_active,
            "session started"
        );
        Ok(events)
    }

    pub fn pause(&mut self) -> Result<Vec<Event>> {
        let Some(event) = self.countdown.pause() else {
            debug!("pause ignored: session not ticking");
            return Ok(Vec::new());
        };
        self.cancel_timers()?;
        info!(
            remaining_secs = self.countdown.remaining_seconds(),
            "session paused"
        );
        Ok(vec![event])
    }

    /// Resume a paused session. The countdown restarts a full one-second
    /// interval; the breathing phase continues with whatever was left of it.
    pub fn resume(&mut self) -> Result<Vec<Event>> {
        let Some(event) = self.countdown.resume() else {
            debug!("resume ignored: session not paused");
            return Ok(Vec::new());
        };
        self.arm_tick();
        if self.guide_active {
            self.arm_phase();
        }
        info!(
            remaining_secs = self.countdown.remaining_seconds(),
            "session resumed"
        );
        Ok(vec![event])
    }

    /// Space bar: start when idle or finished, otherwise pause/resume.
    pub fn toggle_pause(&mut self) -> Result<Vec<Event>> {
        let state = self.countdown.state();
        if state.is_paused {
            self.resume()
        } else if state.is_running {
            self.pause()
        } else {
            self.start(state.total_duration_seconds)
        }
    }

    /// Reset to the configured duration.
    pub fn reset(&mut self) -> Result<Vec<Event>> {
        self.reset_to(self.countdown.total_duration_seconds())
    }

    pub fn reset_to(&mut self, duration_secs: u64) -> Result<Vec<Event>> {
        let event = self.countdown.reset(duration_secs)?;
        self.cancel_timers()?;
        self.breathing.reset();
        self.guide_active = false;
        info!(duration_secs, "session reset");
        Ok(vec![event])
    }

    /// Change the session length. Rejected while a session is running,
    /// including while it is paused.
    pub fn adjust_duration(&mut self, duration_secs: u64) -> Result<Vec<Event>> {
        let event = self.countdown.set_duration(duration_secs).map_err(|e| {
            warn!(duration_secs, "rejected duration change: {e}");
            e
        })?;
        debug!(duration_secs, "duration adjusted");
        Ok(vec![event])
    }

    /// Move to the next longer/shorter preset. No-op at the ends of the list.
    pub fn step_preset(&mut self, step: PresetStep) -> Result<Vec<Event>> {
        let current = self.countdown.total_duration_seconds();
        match self.settings.step_preset(current, step) {
            Some(duration_secs) => self.adjust_duration(duration_secs),
            None => Ok(Vec::new()),
        }
    }

    /// Takes effect at the next start; an in-flight cycle is left alone.
    pub fn toggle_breathing_guide(&mut self, enabled: bool) -> Event {
        self.breathing_guide = enabled;
        if self.countdown.state().is_running {
            debug!(enabled, "breathing guide change deferred to next start");
        }
        Event::BreathingGuideToggled {
            enabled,
            at: Utc::now(),
        }
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Fire every timer due at or before `target_ms`, in order, and move
    /// the clock to `target_ms`.
    pub fn advance_to(&mut self, target_ms: u64) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while let Some(due) = self.clock.pop_due(target_ms) {
            match due.kind {
                TimerKind::CountdownTick => self.on_tick(due, &mut events)?,
                TimerKind::BreathPhase => self.on_phase_end(due, &mut events)?,
            }
        }
        self.clock.set_now(target_ms);
        Ok(events)
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> Result<Vec<Event>> {
        self.advance_to(self.clock.now_ms().saturating_add(delta_ms))
    }

    /// Cancel every pending timer. Returns how many were pending.
    pub fn teardown(&mut self) -> usize {
        if self.phase_timer.take().is_some() {
            self.breathing.suspend(self.clock.now_ms());
        }
        self.tick_timer = None;
        let cancelled = self.clock.clear();
        if cancelled > 0 {
            debug!(cancelled, "cancelled pending timers on teardown");
        }
        cancelled
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn on_tick(&mut self, due: DueTimer, events: &mut Vec<Event>) -> Result<()> {
        if self.tick_timer != Some(due.handle) {
            return Err(stray(due));
        }
        self.tick_timer = None;

        let tick_events = self.countdown.tick();
        let state = self.countdown.state();
        debug!(remaining_secs = state.remaining_seconds, "tick");
        if state.is_ticking() {
            self.arm_tick();
        } else if state.is_complete() {
            self.cancel_timers()?;
            info!(
                duration_secs = state.total_duration_seconds,
                breaths = self.breathing.cycle_count(),
                "session completed"
            );
        }
        events.extend(tick_events);
        Ok(())
    }

    fn on_phase_end(&mut self, due: DueTimer, events: &mut Vec<Event>) -> Result<()> {
        if self.phase_timer != Some(due.handle) {
            return Err(stray(due));
        }
        self.phase_timer = None;

        events.extend(self.breathing.advance());
        debug!(
            phase = %self.breathing.phase(),
            cycle_count = self.breathing.cycle_count(),
            "breathing phase changed"
        );
        if self.countdown.state().is_ticking() {
            self.arm_phase();
        }
        Ok(())
    }

    fn arm_tick(&mut self) {
        self.tick_timer = Some(self.clock.schedule(TICK_MS, TimerKind::CountdownTick));
    }

    fn arm_phase(&mut self) {
        let delay = self.breathing.arm(self.clock.now_ms());
        self.phase_timer = Some(self.clock.schedule(delay, TimerKind::BreathPhase));
    }

    fn cancel_timers(&mut self) -> Result<()> {
        if let Some(handle) = self.tick_timer.take() {
            self.cancel(handle)?;
        }
        if let Some(handle) = self.phase_timer.take() {
            self.breathing.suspend(self.clock.now_ms());
            self.cancel(handle)?;
        }
        Ok(())
    }

    fn cancel(&mut self, handle: TimerHandle) -> Result<()> {
        self.clock.cancel(handle).map_err(|e| {
            error!(%handle, "failed to cancel timer: {e}");
            CoreError::from(e)
        })
    }
}

fn stray(due: DueTimer) -> CoreError {
    error!(handle = %due.handle, kind = ?due.kind, "timer fired without an owner");
    ClockError::StrayTimer(due.handle).into()
}
