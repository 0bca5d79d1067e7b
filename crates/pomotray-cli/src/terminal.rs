//! Terminal stand-ins for the tray collaborators.

use std::io::Write;
use std::time::Duration;

use pomotray_core::effects::notification_text;
use pomotray_core::error::Result;
use pomotray_core::{Notifier, SoundKind, SoundPlayer, TimerMode, TitleDisplay};

const BELL: &[u8] = b"\x07";
const SECOND_CHIME_DELAY: Duration = Duration::from_millis(150);

/// Rings the terminal bell: twice for a finished work interval, once for a
/// break.
pub struct TerminalBell {
    pub enabled: bool,
}

impl SoundPlayer for TerminalBell {
    fn play_completion(&mut self, kind: SoundKind) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut out = std::io::stdout();
        out.write_all(BELL)?;
        out.flush()?;
        if kind == SoundKind::Work {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async {
                        tokio::time::sleep(SECOND_CHIME_DELAY).await;
                        let mut out = std::io::stdout();
                        if let Err(e) = out.write_all(BELL).and_then(|_| out.flush()) {
                            tracing::debug!(error = %e, "bell write failed");
                        }
                    });
                }
                Err(_) => tracing::debug!("no runtime, second chime skipped"),
            }
        }
        Ok(())
    }
}

/// Prints the completion notice. Disabled notifications behave like a
/// denied permission.
pub struct TerminalNotifier {
    pub enabled: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, mode: TimerMode) -> bool {
        if !self.enabled {
            return false;
        }
        let (title, body) = notification_text(mode);
        println!("\r{title} {body}");
        true
    }
}

/// Redraws the countdown in place on stdout.
#[derive(Default)]
pub struct StatusLine;

impl TitleDisplay for StatusLine {
    fn show(&mut self, title: &str) {
        let mut out = std::io::stdout();
        if let Err(e) = write!(out, "\r\x1b[2K{title}").and_then(|_| out.flush()) {
            tracing::debug!(error = %e, "status line write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_notifier_reports_not_shown() {
        let mut notifier = TerminalNotifier { enabled: false };
        assert!(!notifier.notify(TimerMode::Work));
    }

    #[test]
    fn disabled_bell_is_silent_and_ok() {
        let mut bell = TerminalBell { enabled: false };
        assert!(bell.play_completion(SoundKind::Work).is_ok());
    }

    #[tokio::test]
    async fn work_bell_schedules_second_chime_on_runtime() {
        let mut bell = TerminalBell { enabled: true };
        assert!(bell.play_completion(SoundKind::Work).is_ok());
        tokio::time::sleep(SECOND_CHIME_DELAY * 2).await;
    }
}
