//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `observe()`
//! periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!   ^        |          |
//!   +--------+----------+   reset / set_mode
//! ```
//!
//! Remaining time while running is never decremented per call. `start()`
//! captures an anchor `(now, remaining_ms)` and every observation recomputes
//! `anchor.remaining_ms - ms_since(anchor.now)`, so polling cadence and
//! scheduler jitter do not accumulate into the countdown. Pausing keeps the
//! millisecond remainder; only the committed `remaining_seconds` is rounded
//! up to whole seconds.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(&durations);
//! engine.start();
//! // In a loop:
//! if let Transition::Completed { mode } = engine.observe() { /* ... */ }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::mode::{TimerMode, TimerStatus};
use crate::events::Event;
use crate::settings::DurationSettings;

/// Outcome of a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transition {
    NoChange,
    /// The committed remaining time moved.
    Ticked { remaining_seconds: u64 },
    /// The running countdown reached zero. Reported once per running episode.
    Completed { mode: TimerMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    epoch_ms: u64,
    remaining_ms: u64,
}

impl Anchor {
    fn remaining_ms_at(&self, now_ms: u64) -> u64 {
        // A clock that jumped backwards counts as no time elapsed.
        let elapsed_ms = now_ms.saturating_sub(self.epoch_ms);
        self.remaining_ms.saturating_sub(elapsed_ms)
    }
}

fn whole_seconds(ms: u64) -> u64 {
    ms.div_ceil(1000)
}

/// Core timer engine.
///
/// Operates on wall-clock deltas -- no internal thread.
pub struct TimerEngine {
    clock: Arc<dyn Clock>,
    mode: TimerMode,
    status: TimerStatus,
    remaining_seconds: u64,
    /// Exact remainder outside a running episode.
    remaining_ms: u64,
    /// Full duration loaded at the last reset, mode switch or idle sync.
    total_seconds: u64,
    /// Present exactly while `status == Running`.
    anchor: Option<Anchor>,
    completion_reported: bool,
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("mode", &self.mode)
            .field("status", &self.status)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("remaining_ms", &self.remaining_ms)
            .field("total_seconds", &self.total_seconds)
            .field("anchor", &self.anchor)
            .finish()
    }
}

impl TimerEngine {
    /// Create an idle Work timer on the system clock.
    pub fn new(durations: &DurationSettings) -> Self {
        Self::with_clock(Arc::new(SystemClock), durations)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, durations: &DurationSettings) -> Self {
        let total = durations.seconds_for(TimerMode::Work);
        Self {
            clock,
            mode: TimerMode::Work,
            status: TimerStatus::Idle,
            remaining_seconds: total,
            remaining_ms: total * 1000,
            total_seconds: total,
            anchor: None,
            completion_reported: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    /// Last committed value. Call `observe()` first for a fresh reading.
    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn is_idle_in(&self, mode: TimerMode) -> bool {
        self.status == TimerStatus::Idle && self.mode == mode
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_seconds as f64 / self.total_seconds as f64)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            status: self.status,
            remaining_seconds: self.remaining_seconds,
            total_seconds: self.total_seconds,
            progress: self.progress(),
            at: self.clock.now_utc(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.status {
            TimerStatus::Running => None,
            TimerStatus::Idle | TimerStatus::Paused => {
                self.status = TimerStatus::Running;
                self.anchor = Some(Anchor {
                    epoch_ms: self.clock.now_ms(),
                    remaining_ms: self.remaining_ms,
                });
                self.completion_reported = false;
                tracing::debug!(mode = %self.mode, remaining = self.remaining_seconds, "timer started");
                Some(Event::TimerStarted {
                    mode: self.mode,
                    remaining_seconds: self.remaining_seconds,
                    at: self.clock.now_utc(),
                })
            }
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        // Flush elapsed time first.
        if let Some(anchor) = self.anchor.take() {
            self.remaining_ms = anchor.remaining_ms_at(self.clock.now_ms());
            self.remaining_seconds = whole_seconds(self.remaining_ms);
        }
        self.status = TimerStatus::Paused;
        tracing::debug!(mode = %self.mode, remaining = self.remaining_seconds, "timer paused");
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_seconds: self.remaining_seconds,
            at: self.clock.now_utc(),
        })
    }

    /// Back to a full idle interval in the current mode.
    pub fn reset(&mut self, durations: &DurationSettings) -> Option<Event> {
        self.load_idle(durations);
        Some(Event::TimerReset {
            mode: self.mode,
            duration_seconds: self.total_seconds,
            at: self.clock.now_utc(),
        })
    }

    /// Switch mode and load its full duration. An in-progress countdown is
    /// abandoned, not completed.
    pub fn set_mode(&mut self, mode: TimerMode, durations: &DurationSettings) -> Option<Event> {
        let from = self.mode;
        self.mode = mode;
        self.load_idle(durations);
        tracing::debug!(%from, to = %mode, "mode changed");
        Some(Event::ModeChanged {
            from,
            to: mode,
            duration_seconds: self.total_seconds,
            at: self.clock.now_utc(),
        })
    }

    /// Pick up edited durations. Only an idle timer is resized.
    pub fn sync_with_settings(&mut self, durations: &DurationSettings) -> Option<Event> {
        if self.status != TimerStatus::Idle {
            return None;
        }
        let duration = durations.seconds_for(self.mode);
        if duration == self.remaining_seconds && duration == self.total_seconds {
            return None;
        }
        self.remaining_seconds = duration;
        self.remaining_ms = duration * 1000;
        self.total_seconds = duration;
        Some(Event::SettingsSynced {
            mode: self.mode,
            remaining_seconds: duration,
            at: self.clock.now_utc(),
        })
    }

    /// Sample the clock. Call at any cadence.
    pub fn observe(&mut self) -> Transition {
        if self.status != TimerStatus::Running {
            return Transition::NoChange;
        }
        let Some(anchor) = self.anchor else {
            return Transition::NoChange;
        };

        let before = self.remaining_seconds;
        self.remaining_seconds = whole_seconds(anchor.remaining_ms_at(self.clock.now_ms()));

        if self.remaining_seconds == 0 && !self.completion_reported {
            self.completion_reported = true;
            return Transition::Completed { mode: self.mode };
        }
        if self.remaining_seconds != before {
            Transition::Ticked {
                remaining_seconds: self.remaining_seconds,
            }
        } else {
            Transition::NoChange
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn load_idle(&mut self, durations: &DurationSettings) {
        let duration = durations.seconds_for(self.mode);
        self.status = TimerStatus::Idle;
        self.remaining_seconds = duration;
        self.remaining_ms = duration * 1000;
        self.total_seconds = duration;
        self.anchor = None;
        self.completion_reported = false;
    }
}
