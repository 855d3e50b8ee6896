mod breathing;
mod clock;
mod countdown;

pub use breathing::{BreathPattern, BreathPhase, BreathingCycle, BreathingState};
pub use clock::{DueTimer, TimerHandle, TimerKind, TimerQueue};
pub use countdown::{format_mm_ss, CountdownEngine, TimerState};
