use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerMode, TimerStatus};

/// Every state change in the system produces an Event.
/// The presentation layer polls for events and renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        duration_seconds: u64,
        at: DateTime<Utc>,
    },
    ModeChanged {
        from: TimerMode,
        to: TimerMode,
        duration_seconds: u64,
        at: DateTime<Utc>,
    },
    /// An interval counted down to zero. Emitted once per zero-crossing.
    TimerCompleted {
        mode: TimerMode,
        next_mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// The next interval was started without user action.
    AutoStarted {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// An idle timer picked up new duration settings.
    SettingsSynced {
        mode: TimerMode,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    /// Non-fatal: the completed interval could not be stored.
    SessionSaveFailed {
        mode: TimerMode,
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        status: TimerStatus,
        remaining_seconds: u64,
        total_seconds: u64,
        progress: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Warnings the user should see without interrupting the timer.
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::SessionSaveFailed { .. })
    }
}
