//! Completion handling and auto-start sequencing.
//!
//! [`CompletionDispatcher`] is the single writer of the timer engine. The
//! presentation layer calls [`CompletionDispatcher::tick`] on its polling
//! cadence and routes every user command through the dispatcher, which keeps
//! clock sampling and mutations serialized.
//!
//! A zero-crossing is handled in one tick: sound, notification, session
//! record, work-session count, then the switch to the next mode. Starting
//! the next interval is a separate step taken on a later tick, and only if
//! the engine is still idle in the mode that was switched to. Any user
//! command issued in between cancels the pending start.

use std::sync::Arc;

use crate::effects::Collaborators;
use crate::events::Event;
use crate::settings::SettingsStore;
use crate::timer::{format_mm_ss, Clock, TimerEngine, TimerMode, Transition};

pub struct CompletionDispatcher<S: SettingsStore> {
    engine: TimerEngine,
    settings: S,
    collaborators: Collaborators,
    /// Mode an auto-start was requested for, cleared once `start()` fires.
    pending_auto_start: Option<TimerMode>,
    last_title: Option<String>,
}

impl<S: SettingsStore> CompletionDispatcher<S> {
    pub fn new(clock: Arc<dyn Clock>, settings: S, collaborators: Collaborators) -> Self {
        let engine = TimerEngine::with_clock(clock, &settings.durations());
        Self::with_engine(engine, settings, collaborators)
    }

    pub fn with_engine(engine: TimerEngine, settings: S, collaborators: Collaborators) -> Self {
        let mut dispatcher = Self {
            engine,
            settings,
            collaborators,
            pending_auto_start: None,
            last_title: None,
        };
        dispatcher.refresh_display();
        dispatcher
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn pending_auto_start(&self) -> Option<TimerMode> {
        self.pending_auto_start
    }

    /// Current `MM:SS` title.
    pub fn title(&self) -> String {
        format_mm_ss(self.engine.remaining_seconds())
    }

    /// One polling step.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(mode) = self.pending_auto_start.take() {
            if self.engine.is_idle_in(mode) {
                if self.engine.start().is_some() {
                    tracing::debug!(%mode, "auto-started next interval");
                    events.push(Event::AutoStarted {
                        mode,
                        at: self.engine.clock().now_utc(),
                    });
                }
            } else {
                tracing::debug!(%mode, "auto-start dropped, timer no longer idle in that mode");
            }
        }

        if let Transition::Completed { mode } = self.engine.observe() {
            events.extend(self.complete(mode));
        }

        self.refresh_display();
        events
    }

    // ── User commands ────────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        self.pending_auto_start = None;
        let events = self.engine.start().into_iter().collect();
        self.refresh_display();
        events
    }

    pub fn pause(&mut self) -> Vec<Event> {
        self.pending_auto_start = None;
        let events = self.engine.pause().into_iter().collect();
        self.refresh_display();
        events
    }

    pub fn reset(&mut self) -> Vec<Event> {
        self.pending_auto_start = None;
        let events = self
            .engine
            .reset(&self.settings.durations())
            .into_iter()
            .collect();
        self.refresh_display();
        events
    }

    pub fn set_mode(&mut self, mode: TimerMode) -> Vec<Event> {
        self.pending_auto_start = None;
        let events = self
            .engine
            .set_mode(mode, &self.settings.durations())
            .into_iter()
            .collect();
        self.refresh_display();
        events
    }

    /// "Start break" shortcut: a long break once enough work sessions have
    /// accumulated, otherwise a short one. Taking the long break resets the
    /// count.
    pub fn start_break(&mut self) -> Vec<Event> {
        self.pending_auto_start = None;
        let mode = if self.settings.work_session_count() >= self.settings.long_break_interval() {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        };

        let mut events: Vec<Event> = self
            .engine
            .set_mode(mode, &self.settings.durations())
            .into_iter()
            .collect();
        if mode == TimerMode::LongBreak {
            self.settings.reset_work_sessions();
        }
        if self.engine.is_idle_in(mode) {
            events.extend(self.engine.start());
        }
        self.refresh_display();
        events
    }

    // ── Settings edits ───────────────────────────────────────────────

    /// Store a clamped duration and resync an idle timer.
    pub fn set_duration(&mut self, mode: TimerMode, minutes: i64) -> Vec<Event> {
        let stored = self.settings.set_duration(mode, minutes);
        tracing::debug!(%mode, minutes = stored, "duration updated");
        self.sync_with_settings()
    }

    pub fn reset_durations(&mut self) -> Vec<Event> {
        self.settings.reset_durations();
        self.sync_with_settings()
    }

    pub fn reset_work_sessions(&mut self) {
        self.settings.reset_work_sessions();
    }

    /// Apply an arbitrary edit to the store, then resync.
    pub fn edit_settings(&mut self, edit: impl FnOnce(&mut S)) -> Vec<Event> {
        edit(&mut self.settings);
        self.sync_with_settings()
    }

    pub fn sync_with_settings(&mut self) -> Vec<Event> {
        let events = self
            .engine
            .sync_with_settings(&self.settings.durations())
            .into_iter()
            .collect();
        self.refresh_display();
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, mode: TimerMode) -> Vec<Event> {
        let at = self.engine.clock().now_utc();
        let duration_seconds = self.engine.total_seconds();
        let next_mode = mode.next_after_completion();
        tracing::info!(%mode, %next_mode, duration_seconds, "interval complete");

        let mut events = vec![Event::TimerCompleted {
            mode,
            next_mode,
            at,
        }];

        if let Err(e) = self.collaborators.sound.play_completion(mode.sound_kind()) {
            tracing::warn!(error = %e, "completion sound failed");
        }
        if !self.collaborators.notifier.notify(mode) {
            tracing::debug!(%mode, "notification not shown");
        }
        if let Err(e) = self
            .collaborators
            .sessions
            .save_session(mode, duration_seconds, at)
        {
            tracing::warn!(%mode, error = %e, "failed to save session");
            events.push(Event::SessionSaveFailed {
                mode,
                message: e.to_string(),
                at,
            });
        }

        if mode == TimerMode::Work {
            let count = self.settings.increment_work_sessions();
            tracing::debug!(count, "work sessions completed");
        }

        events.extend(self.engine.set_mode(next_mode, &self.settings.durations()));
        if self.settings.auto_start().should_auto_start(next_mode) {
            self.pending_auto_start = Some(next_mode);
        }
        events
    }

    fn refresh_display(&mut self) {
        let title = self.title();
        if self.last_title.as_deref() != Some(title.as_str()) {
            self.collaborators.display.show(&title);
            self.last_title = Some(title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AutoStartPolicy, MemorySettings};
    use crate::timer::{ManualClock, TimerStatus};

    fn dispatcher(policy: AutoStartPolicy) -> (CompletionDispatcher<MemorySettings>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let settings = MemorySettings {
            auto_start: policy,
            ..MemorySettings::default()
        };
        let d = CompletionDispatcher::new(Arc::new(clock.clone()), settings, Collaborators::silent());
        (d, clock)
    }

    #[test]
    fn work_completion_switches_to_idle_short_break() {
        let (mut d, clock) = dispatcher(AutoStartPolicy::AfterBreaks);
        d.start();
        clock.advance_ms(1_500_000);
        let events = d.tick();

        assert!(events
            .iter()
            .any(|e| matches!(e, Event::TimerCompleted { mode: TimerMode::Work, .. })));
        assert_eq!(d.engine().mode(), TimerMode::ShortBreak);
        assert_eq!(d.engine().status(), TimerStatus::Idle);
        assert_eq!(d.engine().remaining_seconds(), 300);
        assert_eq!(d.settings().work_session_count, 1);
        assert_eq!(d.pending_auto_start(), None);

        d.tick();
        assert_eq!(d.engine().status(), TimerStatus::Idle);
    }

    #[test]
    fn break_completion_auto_starts_work_on_next_tick() {
        let (mut d, clock) = dispatcher(AutoStartPolicy::AfterBreaks);
        d.set_mode(TimerMode::ShortBreak);
        d.start();
        clock.advance_ms(300_000);
        d.tick();
        assert!(d.engine().is_idle_in(TimerMode::Work));
        assert_eq!(d.pending_auto_start(), Some(TimerMode::Work));

        let events = d.tick();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::AutoStarted { mode: TimerMode::Work, .. })));
        assert_eq!(d.engine().status(), TimerStatus::Running);
        assert_eq!(d.pending_auto_start(), None);
    }

    #[test]
    fn always_policy_chains_into_breaks() {
        let (mut d, clock) = dispatcher(AutoStartPolicy::Always);
        d.start();
        clock.advance_ms(1_500_000);
        d.tick();
        d.tick();
        assert_eq!(d.engine().mode(), TimerMode::ShortBreak);
        assert_eq!(d.engine().status(), TimerStatus::Running);
    }

    #[test]
    fn never_policy_leaves_work_idle() {
        let (mut d, clock) = dispatcher(AutoStartPolicy::Never);
        d.set_mode(TimerMode::LongBreak);
        d.start();
        clock.advance_ms(900_000);
        d.tick();
        d.tick();
        assert!(d.engine().is_idle_in(TimerMode::Work));
    }

    #[test]
    fn user_reset_between_switch_and_start_is_respected() {
        let (mut d, clock) = dispatcher(AutoStartPolicy::AfterBreaks);
        d.set_mode(TimerMode::ShortBreak);
        d.start();
        clock.advance_ms(300_000);
        d.tick();
        assert_eq!(d.pending_auto_start(), Some(TimerMode::Work));

        d.reset();
        d.tick();
        assert!(d.engine().is_idle_in(TimerMode::Work));
    }

    #[test]
    fn user_pause_between_switch_and_start_is_respected() {
        let (mut d, clock) = dispatcher(AutoStartPolicy::AfterBreaks);
        d.set_mode(TimerMode::ShortBreak);
        d.start();
        clock.advance_ms(300_000);
        d.tick();
        assert_eq!(d.pending_auto_start(), Some(TimerMode::Work));

        assert!(d.pause().is_empty());
        assert_eq!(d.pending_auto_start(), None);
        d.tick();
        assert!(d.engine().is_idle_in(TimerMode::Work));
        assert_eq!(d.engine().remaining_seconds(), 1500);
    }

    #[test]
    fn user_mode_switch_drops_pending_start() {
        let (mut d, clock) = dispatcher(AutoStartPolicy::AfterBreaks);
        d.set_mode(TimerMode::LongBreak);
        d.start();
        clock.advance_ms(900_000);
        d.tick();

        d.set_mode(TimerMode::LongBreak);
        d.tick();
        assert!(d.engine().is_idle_in(TimerMode::LongBreak));
    }

    #[test]
    fn start_break_picks_short_then_long() {
        let (mut d, _) = dispatcher(AutoStartPolicy::AfterBreaks);
        d.start_break();
        assert_eq!(d.engine().mode(), TimerMode::ShortBreak);
        assert_eq!(d.engine().status(), TimerStatus::Running);

        d.edit_settings(|s| s.work_session_count = 4);
        d.start_break();
        assert_eq!(d.engine().mode(), TimerMode::LongBreak);
        assert_eq!(d.engine().remaining_seconds(), 900);
        assert_eq!(d.engine().status(), TimerStatus::Running);
        assert_eq!(d.settings().work_session_count, 0);
    }

    #[test]
    fn duration_edit_resizes_only_idle_timer() {
        let (mut d, clock) = dispatcher(AutoStartPolicy::AfterBreaks);
        d.set_duration(TimerMode::Work, 30);
        assert_eq!(d.engine().remaining_seconds(), 1800);

        d.start();
        clock.advance_ms(10_000);
        d.tick();
        d.set_duration(TimerMode::Work, 45);
        assert_eq!(d.engine().remaining_seconds(), 1790);

        d.reset();
        assert_eq!(d.engine().remaining_seconds(), 2700);
    }

    #[test]
    fn reset_durations_restores_defaults_on_idle_timer() {
        let (mut d, _) = dispatcher(AutoStartPolicy::AfterBreaks);
        d.set_duration(TimerMode::Work, 50);
        d.reset_durations();
        assert_eq!(d.engine().remaining_seconds(), 1500);
        assert_eq!(d.title(), "25:00");
    }
}
