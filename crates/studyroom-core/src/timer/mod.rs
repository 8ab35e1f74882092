mod engine;
mod phase;

pub use engine::{PersistedTimer, TimerEngine};
pub use phase::{
    format_clock, Phase, TimerDurations, MAX_BREAK_MINUTES, MAX_FOCUS_MINUTES, MIN_MINUTES,
};
