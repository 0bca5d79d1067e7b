//! Side-effecting collaborators invoked when an interval completes.
//!
//! The core does not own audio, OS notification delivery or the tray title;
//! it only calls these traits. Failures are reported back so the dispatcher
//! can log them, but none of them can stop the timer.

use chrono::{DateTime, Utc};

use crate::timer::{SoundKind, TimerMode};

pub trait SoundPlayer: Send {
    fn play_completion(&mut self, kind: SoundKind) -> crate::error::Result<()>;
}

pub trait Notifier: Send {
    /// Returns `false` when permission is missing and nothing was shown.
    fn notify(&mut self, mode: TimerMode) -> bool;
}

pub trait SessionSink: Send {
    fn save_session(
        &mut self,
        mode: TimerMode,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
    ) -> crate::error::Result<()>;
}

/// Receives the `MM:SS` title whenever the remaining time changes.
pub trait TitleDisplay: Send {
    fn show(&mut self, title: &str);
}

/// Notification title and body for a completed interval.
pub fn notification_text(mode: TimerMode) -> (&'static str, &'static str) {
    match mode {
        TimerMode::Work => ("Focus session complete!", "Time for a break. Great work!"),
        TimerMode::ShortBreak => ("Break is over", "Ready to focus again?"),
        TimerMode::LongBreak => ("Long break is over", "Ready to get back to work?"),
    }
}

/// Does nothing. Used for headless runs and as a default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play_completion(&mut self, _kind: SoundKind) -> crate::error::Result<()> {
        Ok(())
    }
}

impl Notifier for Silent {
    fn notify(&mut self, _mode: TimerMode) -> bool {
        false
    }
}

impl SessionSink for Silent {
    fn save_session(
        &mut self,
        _mode: TimerMode,
        _duration_seconds: u64,
        _completed_at: DateTime<Utc>,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}

impl TitleDisplay for Silent {
    fn show(&mut self, _title: &str) {}
}

/// The full set of collaborators handed to the dispatcher.
pub struct Collaborators {
    pub sound: Box<dyn SoundPlayer>,
    pub notifier: Box<dyn Notifier>,
    pub sessions: Box<dyn SessionSink>,
    pub display: Box<dyn TitleDisplay>,
}

impl Collaborators {
    pub fn silent() -> Self {
        Self {
            sound: Box::new(Silent),
            notifier: Box::new(Silent),
            sessions: Box::new(Silent),
            display: Box::new(Silent),
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mode_has_notification_text() {
        for mode in TimerMode::ALL {
            let (title, body) = notification_text(mode);
            assert!(!title.is_empty());
            assert!(!body.is_empty());
        }
        assert_eq!(notification_text(TimerMode::Work).0, "Focus session complete!");
    }

    #[test]
    fn silent_notifier_reports_not_shown() {
        let mut collaborators = Collaborators::silent();
        assert!(!collaborators.notifier.notify(TimerMode::Work));
        assert!(collaborators
            .sessions
            .save_session(TimerMode::Work, 1500, Utc::now())
            .is_ok());
    }
}
