//! # Pomotray Core Library
//!
//! Core logic for the Pomotray focus/break interval timer. The CLI binary is
//! a thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-anchored countdown state machine. The
//!   caller samples it with `observe()` at any cadence; remaining time is
//!   always derived from elapsed time since the anchor, never decremented.
//! - **Completion Dispatcher**: Single writer of the engine. Detects the
//!   zero-crossing once, fires sound/notification/persistence collaborators
//!   and sequences the switch to the next mode and its optional auto-start.
//! - **Settings**: Clamped per-mode durations, the work-session count and
//!   the auto-start policy, stored as TOML.
//! - **Storage**: SQLite session records and period statistics.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`CompletionDispatcher`]: Completion side effects and auto-start
//! - [`SettingsStore`]: Settings seen by the timer
//! - [`Database`]: Session persistence and statistics
//! - [`Config`]: Application configuration management

pub mod dispatcher;
pub mod effects;
pub mod error;
pub mod events;
pub mod settings;
pub mod storage;
pub mod timer;

pub use dispatcher::CompletionDispatcher;
pub use effects::{Collaborators, Notifier, SessionSink, Silent, SoundPlayer, TitleDisplay};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use settings::{AutoStartPolicy, ConfigSettings, DurationSettings, MemorySettings, SettingsStore};
pub use storage::{Config, Database, Period, SessionRecord, Stats};
pub use timer::{
    format_mm_ss, Clock, ManualClock, SoundKind, SystemClock, TimerEngine, TimerMode, TimerStatus,
    Transition,
};
