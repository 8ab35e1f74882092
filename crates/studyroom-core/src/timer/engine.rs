//! Focus/break timer engine.
//!
//! The engine has no internal thread: the caller invokes `tick()` once per
//! second while the timer runs. Between process runs the engine is saved as
//! a [`PersistedTimer`] anchored to the wall clock, so a restore recomputes
//! the remaining time from elapsed wall-clock time instead of counting ticks.
//!
//! ## State Transitions
//!
//! ```text
//! Focus{running} <-> Focus{paused}
//!       |  session complete / switch
//!       v
//! Break{running} <-> Break{paused}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::{format_clock, Phase, TimerDurations};
use crate::events::Event;

/// Saved timer state, stored under the `timerState` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTimer {
    /// Wall-clock anchor (epoch milliseconds) for `duration`.
    pub start_time: i64,
    /// Seconds left in the phase at `start_time`.
    pub duration: u64,
    pub is_break: bool,
    pub is_active: bool,
    #[serde(default)]
    pub completed_sessions: u32,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    durations: TimerDurations,
    phase: Phase,
    remaining_secs: u64,
    running: bool,
    completed_sessions: u32,
    auto_continue: bool,
    /// Saved `(start_time, duration)` a resumed countdown was derived from.
    /// Cleared by anything that changes the countdown.
    anchor: Option<(i64, u64)>,
}

impl TimerEngine {
    /// Create an idle timer at the start of a focus phase.
    pub fn new(durations: TimerDurations) -> Self {
        Self {
            durations,
            phase: Phase::Focus,
            remaining_secs: durations.secs(Phase::Focus),
            running: false,
            completed_sessions: 0,
            auto_continue: false,
            anchor: None,
        }
    }

    pub fn with_auto_continue(mut self, auto_continue: bool) -> Self {
        self.auto_continue = auto_continue;
        self
    }

    /// Rebuild a timer from its saved slot.
    ///
    /// A running session resumes with `duration - elapsed`. If that is zero
    /// or less the session-complete transition is applied right away and its
    /// event returned.
    pub fn restore(
        saved: &PersistedTimer,
        durations: TimerDurations,
        auto_continue: bool,
        now: DateTime<Utc>,
    ) -> (Self, Option<Event>) {
        let phase = if saved.is_break {
            Phase::Break
        } else {
            Phase::Focus
        };
        let mut engine = Self {
            durations,
            phase,
            remaining_secs: saved.duration,
            running: saved.is_active,
            completed_sessions: saved.completed_sessions,
            auto_continue,
            anchor: None,
        };

        if saved.is_active {
            let elapsed_secs = now
                .timestamp_millis()
                .saturating_sub(saved.start_time)
                .max(0)
                / 1000;
            let remaining = i64::try_from(saved.duration).unwrap_or(i64::MAX) - elapsed_secs;
            if remaining <= 0 {
                engine.remaining_secs = 0;
                let event = engine.complete_session();
                return (engine, Some(event));
            }
            engine.remaining_secs = remaining as u64;
            engine.anchor = Some((saved.start_time, saved.duration));
        } else if engine.remaining_secs == 0 {
            engine.remaining_secs = durations.secs(phase);
        }

        (engine, None)
    }

    /// State for saving.
    ///
    /// A countdown resumed by [`restore`](Self::restore) and left untouched
    /// keeps its original anchor, so repeated restore/persist cycles lose no
    /// sub-second time. Anything else is anchored to `now`.
    pub fn persist(&self, now: DateTime<Utc>) -> PersistedTimer {
        let (start_time, duration) = match self.anchor {
            Some(anchor) if self.running => anchor,
            _ => (now.timestamp_millis(), self.remaining_secs),
        };
        PersistedTimer {
            start_time,
            duration,
            is_break: self.phase == Phase::Break,
            is_active: self.running,
            completed_sessions: self.completed_sessions,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    pub fn durations(&self) -> TimerDurations {
        self.durations
    }

    pub fn auto_continue(&self) -> bool {
        self.auto_continue
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.remaining_secs)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            label: self.phase.label().to_string(),
            running: self.running,
            remaining_secs: self.remaining_secs,
            display: self.display(),
            completed_sessions: self.completed_sessions,
            focus_minutes: self.durations.focus_minutes(),
            break_minutes: self.durations.break_minutes(),
            auto_continue: self.auto_continue,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        if self.remaining_secs == 0 {
            self.remaining_secs = self.durations.secs(self.phase);
        }
        self.running = true;
        self.anchor = None;
        Some(Event::TimerStarted {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.anchor = None;
        Some(Event::TimerPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Start when paused, pause when running.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Back to the full length of the current phase, stopped.
    pub fn reset(&mut self) -> Option<Event> {
        self.running = false;
        self.remaining_secs = self.durations.secs(self.phase);
        self.anchor = None;
        Some(Event::TimerReset {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Force the other phase, stopped, at its full length.
    pub fn switch_phase(&mut self) -> Option<Event> {
        self.phase = self.phase.other();
        self.remaining_secs = self.durations.secs(self.phase);
        self.running = false;
        self.anchor = None;
        Some(Event::PhaseSwitched {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn set_auto_continue(&mut self, auto_continue: bool) {
        self.auto_continue = auto_continue;
    }

    /// Change the focus length (clamped to 1-90). Resets the countdown when
    /// the timer is in the focus phase.
    pub fn set_focus_minutes(&mut self, minutes: u32) -> Option<Event> {
        let minutes = self.durations.set_focus_minutes(minutes);
        self.apply_duration_change(Phase::Focus, minutes)
    }

    /// Change the break length (clamped to 1-30). Resets the countdown when
    /// the timer is in the break phase.
    pub fn set_break_minutes(&mut self, minutes: u32) -> Option<Event> {
        let minutes = self.durations.set_break_minutes(minutes);
        self.apply_duration_change(Phase::Break, minutes)
    }

    /// Advance one second. Returns the completion event when the countdown
    /// reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.anchor = None;
        if self.remaining_secs == 0 {
            return Some(self.complete_session());
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply_duration_change(&mut self, phase: Phase, minutes: u32) -> Option<Event> {
        if self.phase == phase {
            self.remaining_secs = self.durations.secs(phase);
            self.anchor = None;
        }
        Some(Event::DurationChanged {
            phase,
            minutes,
            at: Utc::now(),
        })
    }

    fn complete_session(&mut self) -> Event {
        let finished = self.phase;
        if finished == Phase::Focus {
            self.completed_sessions += 1;
        }
        self.phase = finished.other();
        self.remaining_secs = self.durations.secs(self.phase);
        self.running = self.auto_continue;
        self.anchor = None;

        tracing::info!(
            finished = ?finished,
            completed = self.completed_sessions,
            "timer session complete"
        );

        Event::SessionCompleted {
            finished,
            next: self.phase,
            completed_sessions: self.completed_sessions,
            auto_continued: self.running,
            at: Utc::now(),
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerDurations::default())
    }
}
