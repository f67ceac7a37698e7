//! Pomodoro focus timer.
//!
//! The timer is driven from outside: the UI calls [`FocusTimer::tick`] with
//! the time that passed since the last call. It never touches task state.

use std::fmt;
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimerKind::Pomodoro => "Pomodoro",
            TimerKind::ShortBreak => "Short Break",
            TimerKind::LongBreak => "Long Break",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    pub pomodoro: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
    pub long_break_every: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Durations {
            pomodoro: Duration::from_secs(25 * 60),
            short_break: Duration::from_secs(5 * 60),
            long_break: Duration::from_secs(15 * 60),
            long_break_every: 4,
        }
    }
}

impl From<&Config> for Durations {
    fn from(c: &Config) -> Self {
        Durations {
            pomodoro: c.pomodoro(),
            short_break: c.short_break(),
            long_break: c.long_break(),
            long_break_every: c.long_break_every.max(1),
        }
    }
}

impl Durations {
    pub fn of(&self, kind: TimerKind) -> Duration {
        match kind {
            TimerKind::Pomodoro => self.pomodoro,
            TimerKind::ShortBreak => self.short_break,
            TimerKind::LongBreak => self.long_break,
        }
    }
}

/// What a tick that reached zero finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    pub kind: TimerKind,
    /// The timer the clock switched to.
    pub next: TimerKind,
}

#[derive(Debug, Clone)]
pub struct FocusTimer {
    durations: Durations,
    active: TimerKind,
    remaining: Duration,
    running: bool,
    sessions: u32,
    total_focus: Duration,
}

impl FocusTimer {
    pub fn new(durations: Durations) -> Self {
        FocusTimer {
            durations,
            active: TimerKind::Pomodoro,
            remaining: durations.pomodoro,
            running: false,
            sessions: 0,
            total_focus: Duration::ZERO,
        }
    }

    pub fn active(&self) -> TimerKind {
        self.active
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Completed pomodoros.
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    pub fn total_focus(&self) -> Duration {
        self.total_focus
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Stops the clock and refills the current timer.
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining = self.durations.of(self.active);
    }

    /// Stops the clock and switches to a full `kind` timer.
    pub fn switch_to(&mut self, kind: TimerKind) {
        self.active = kind;
        self.reset();
    }

    /// Fraction of the current timer already used, from 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        let total = self.durations.of(self.active).as_secs_f64();
        if total == 0.0 {
            return 1.0;
        }
        ((total - self.remaining.as_secs_f64()) / total).clamp(0.0, 1.0)
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }

    /// Advances a running timer by `elapsed`.
    ///
    /// When the timer runs out it stops and switches: a pomodoro is counted
    /// and followed by a break (long after every `long_break_every`
    /// sessions), a break is followed by a pomodoro.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Finished> {
        if !self.running {
            return None;
        }
        if elapsed < self.remaining {
            self.remaining -= elapsed;
            return None;
        }
        let kind = self.active;
        let next = match kind {
            TimerKind::Pomodoro => {
                self.sessions += 1;
                self.total_focus += self.durations.pomodoro;
                if self.sessions % self.durations.long_break_every.max(1) == 0 {
                    TimerKind::LongBreak
                } else {
                    TimerKind::ShortBreak
                }
            }
            TimerKind::ShortBreak | TimerKind::LongBreak => TimerKind::Pomodoro,
        };
        self.switch_to(next);
        Some(Finished { kind, next })
    }
}

impl Default for FocusTimer {
    fn default() -> Self {
        FocusTimer::new(Durations::default())
    }
}

pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
