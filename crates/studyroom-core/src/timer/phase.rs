use serde::{Deserialize, Serialize};

pub const MIN_MINUTES: u32 = 1;
pub const MAX_FOCUS_MINUTES: u32 = 90;
pub const MAX_BREAK_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn other(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Focus => "Focus Time",
            Phase::Break => "Break Time",
        }
    }
}

/// Configured phase lengths, always inside the allowed bounds
/// (focus 1-90 minutes, break 1-30 minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDurations {
    focus_minutes: u32,
    break_minutes: u32,
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            break_minutes: 5,
        }
    }
}

impl TimerDurations {
    /// Build durations, clamping each value to the nearest bound.
    pub fn new(focus_minutes: u32, break_minutes: u32) -> Self {
        Self {
            focus_minutes: clamp_focus(focus_minutes),
            break_minutes: clamp_break(break_minutes),
        }
    }

    pub fn focus_minutes(&self) -> u32 {
        self.focus_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn set_focus_minutes(&mut self, minutes: u32) -> u32 {
        self.focus_minutes = clamp_focus(minutes);
        self.focus_minutes
    }

    pub fn set_break_minutes(&mut self, minutes: u32) -> u32 {
        self.break_minutes = clamp_break(minutes);
        self.break_minutes
    }

    pub fn minutes(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.focus_minutes,
            Phase::Break => self.break_minutes,
        }
    }

    pub fn secs(&self, phase: Phase) -> u64 {
        u64::from(self.minutes(phase)) * 60
    }

    /// Parse user-typed minutes. Non-numeric input yields `None` (leave the
    /// current value alone); numbers are clamped by the setters, negatives
    /// become the lower bound.
    pub fn parse_minutes(input: &str) -> Option<u32> {
        let n: i64 = input.trim().parse().ok()?;
        Some(n.clamp(0, i64::from(u32::MAX)) as u32)
    }
}

fn clamp_focus(minutes: u32) -> u32 {
    minutes.clamp(MIN_MINUTES, MAX_FOCUS_MINUTES)
}

fn clamp_break(minutes: u32) -> u32 {
    minutes.clamp(MIN_MINUTES, MAX_BREAK_MINUTES)
}

/// Format seconds as `MM:SS`.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_clamp_to_nearest_bound() {
        let d = TimerDurations::new(0, 45);
        assert_eq!(d.focus_minutes(), 1);
        assert_eq!(d.break_minutes(), 30);

        let d = TimerDurations::new(120, 5);
        assert_eq!(d.focus_minutes(), 90);
        assert_eq!(d.secs(Phase::Break), 300);
    }

    #[test]
    fn parse_minutes_ignores_garbage() {
        assert_eq!(TimerDurations::parse_minutes("25"), Some(25));
        assert_eq!(TimerDurations::parse_minutes(" 7 "), Some(7));
        assert_eq!(TimerDurations::parse_minutes("-3"), Some(0));
        assert_eq!(TimerDurations::parse_minutes("abc"), None);
        assert_eq!(TimerDurations::parse_minutes(""), None);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(5400), "90:00");
    }

    #[test]
    fn phase_flips() {
        assert_eq!(Phase::Focus.other(), Phase::Break);
        assert_eq!(Phase::Break.other(), Phase::Focus);
    }
}
