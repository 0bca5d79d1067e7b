//! Duration settings and the settings store seen by the timer.
//!
//! The store is mutated independently of the engine (the user edits durations
//! while a countdown may be running). The engine never holds on to a copy;
//! it is handed the current [`DurationSettings`] at reset, mode switch and
//! sync time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::Config;
use crate::timer::TimerMode;

pub const DEFAULT_WORK_MIN: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MIN: u32 = 5;
pub const DEFAULT_LONG_BREAK_MIN: u32 = 15;
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

/// Interval lengths in minutes, one per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSettings {
    #[serde(default = "default_work")]
    pub work: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
}

fn default_work() -> u32 {
    DEFAULT_WORK_MIN
}
fn default_short_break() -> u32 {
    DEFAULT_SHORT_BREAK_MIN
}
fn default_long_break() -> u32 {
    DEFAULT_LONG_BREAK_MIN
}

impl Default for DurationSettings {
    fn default() -> Self {
        Self {
            work: DEFAULT_WORK_MIN,
            short_break: DEFAULT_SHORT_BREAK_MIN,
            long_break: DEFAULT_LONG_BREAK_MIN,
        }
    }
}

/// Clamp a user-entered minute value into `[1, mode.max_minutes()]`.
pub fn clamp_minutes(mode: TimerMode, minutes: i64) -> u32 {
    minutes.clamp(1, i64::from(mode.max_minutes())) as u32
}

impl DurationSettings {
    pub fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work,
            TimerMode::ShortBreak => self.short_break,
            TimerMode::LongBreak => self.long_break,
        }
    }

    pub fn seconds_for(&self, mode: TimerMode) -> u64 {
        u64::from(self.minutes_for(mode)) * 60
    }

    /// Set one mode's duration, clamped. Returns the stored value.
    pub fn set(&mut self, mode: TimerMode, minutes: i64) -> u32 {
        let clamped = clamp_minutes(mode, minutes);
        match mode {
            TimerMode::Work => self.work = clamped,
            TimerMode::ShortBreak => self.short_break = clamped,
            TimerMode::LongBreak => self.long_break = clamped,
        }
        clamped
    }

    /// Copy with every value pulled back into bounds.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for mode in TimerMode::ALL {
            out.set(mode, i64::from(self.minutes_for(mode)));
        }
        out
    }
}

/// Which completions chain straight into the next interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoStartPolicy {
    /// Only a finished break starts the following work interval.
    #[default]
    AfterBreaks,
    Always,
    Never,
}

impl AutoStartPolicy {
    pub fn should_auto_start(&self, next: TimerMode) -> bool {
        match self {
            AutoStartPolicy::AfterBreaks => next == TimerMode::Work,
            AutoStartPolicy::Always => true,
            AutoStartPolicy::Never => false,
        }
    }
}

/// Settings the timer and the completion dispatcher read from.
pub trait SettingsStore {
    fn durations(&self) -> DurationSettings;
    fn work_session_count(&self) -> u32;
    /// Returns the new count.
    fn increment_work_sessions(&mut self) -> u32;
    fn reset_work_sessions(&mut self);
    /// Work sessions required before the break shortcut picks a long break.
    fn long_break_interval(&self) -> u32;
    fn auto_start(&self) -> AutoStartPolicy;
    /// Store a clamped duration. Returns the stored minutes.
    fn set_duration(&mut self, mode: TimerMode, minutes: i64) -> u32;
    fn reset_durations(&mut self);
}

/// Non-persistent store.
#[derive(Debug, Clone)]
pub struct MemorySettings {
    pub durations: DurationSettings,
    pub work_session_count: u32,
    pub long_break_interval: u32,
    pub auto_start: AutoStartPolicy,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            durations: DurationSettings::default(),
            work_session_count: 0,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            auto_start: AutoStartPolicy::default(),
        }
    }
}

impl MemorySettings {
    pub fn with_durations(durations: DurationSettings) -> Self {
        Self {
            durations: durations.clamped(),
            ..Self::default()
        }
    }
}

impl SettingsStore for MemorySettings {
    fn durations(&self) -> DurationSettings {
        self.durations
    }

    fn work_session_count(&self) -> u32 {
        self.work_session_count
    }

    fn increment_work_sessions(&mut self) -> u32 {
        self.work_session_count = self.work_session_count.saturating_add(1);
        self.work_session_count
    }

    fn reset_work_sessions(&mut self) {
        self.work_session_count = 0;
    }

    fn long_break_interval(&self) -> u32 {
        self.long_break_interval
    }

    fn auto_start(&self) -> AutoStartPolicy {
        self.auto_start
    }

    fn set_duration(&mut self, mode: TimerMode, minutes: i64) -> u32 {
        self.durations.set(mode, minutes)
    }

    fn reset_durations(&mut self) {
        self.durations = DurationSettings::default();
    }
}

/// Store backed by the TOML [`Config`], saved after every mutation.
///
/// A failed save is logged and the in-memory value is kept, so the running
/// timer always sees the latest edit.
#[derive(Debug, Clone)]
pub struct ConfigSettings {
    config: Config,
    path: PathBuf,
}

impl ConfigSettings {
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self { config, path }
    }

    /// Load from the default location, falling back to defaults.
    pub fn load_or_default() -> Self {
        let path = match Config::path() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "config directory unavailable, using defaults in cwd");
                PathBuf::from("config.toml")
            }
        };
        let config = Config::load_from_or_default(&path);
        Self { config, path }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write one edit through to disk. The file is re-read first so edits
    /// made by another process to other keys survive.
    fn persist(&self, edit: impl FnOnce(&mut Config)) {
        let mut on_disk = Config::load_from_or_default(&self.path);
        edit(&mut on_disk);
        if let Err(e) = on_disk.save_to(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist settings");
        }
    }
}

impl SettingsStore for ConfigSettings {
    fn durations(&self) -> DurationSettings {
        self.config.durations.clamped()
    }

    fn work_session_count(&self) -> u32 {
        self.config.sessions.work_session_count
    }

    fn increment_work_sessions(&mut self) -> u32 {
        let sessions = &mut self.config.sessions;
        sessions.work_session_count = sessions.work_session_count.saturating_add(1);
        let count = sessions.work_session_count;
        self.persist(|c| c.sessions.work_session_count = count);
        count
    }

    fn reset_work_sessions(&mut self) {
        self.config.sessions.work_session_count = 0;
        self.persist(|c| c.sessions.work_session_count = 0);
    }

    fn long_break_interval(&self) -> u32 {
        self.config.sessions.long_break_interval.max(1)
    }

    fn auto_start(&self) -> AutoStartPolicy {
        self.config.timer.auto_start
    }

    fn set_duration(&mut self, mode: TimerMode, minutes: i64) -> u32 {
        let stored = self.config.durations.set(mode, minutes);
        self.persist(|c| {
            c.durations.set(mode, i64::from(stored));
        });
        stored
    }

    fn reset_durations(&mut self) {
        self.config.durations = DurationSettings::default();
        self.persist(|c| c.durations = DurationSettings::default());
    }
}
