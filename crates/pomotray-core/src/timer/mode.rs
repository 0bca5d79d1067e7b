use serde::{Deserialize, Serialize};

/// Which interval the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Work,
    ShortBreak,
    LongBreak,
}

/// Completion sound family. Breaks share a single softer chime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundKind {
    Work,
    Break,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Work, TimerMode::ShortBreak, TimerMode::LongBreak];

    /// Identifier used in the session table and in config keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "shortBreak",
            TimerMode::LongBreak => "longBreak",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Work => "Focus",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    /// Upper bound, in minutes, accepted for this mode's duration.
    pub fn max_minutes(&self) -> u32 {
        match self {
            TimerMode::Work => 60,
            TimerMode::ShortBreak => 30,
            TimerMode::LongBreak => 60,
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, TimerMode::Work)
    }

    pub fn sound_kind(&self) -> SoundKind {
        if self.is_break() {
            SoundKind::Break
        } else {
            SoundKind::Work
        }
    }

    /// Mode that follows a natural countdown completion.
    pub fn next_after_completion(&self) -> TimerMode {
        match self {
            TimerMode::Work => TimerMode::ShortBreak,
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Work,
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" | "focus" => Ok(TimerMode::Work),
            "shortBreak" | "short-break" | "short_break" | "short" => Ok(TimerMode::ShortBreak),
            "longBreak" | "long-break" | "long_break" | "long" => Ok(TimerMode::LongBreak),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    /// Full duration loaded, not counting down.
    Idle,
    Running,
    /// Remaining time frozen at the last observed value.
    Paused,
}

/// Format seconds as `MM:SS` for the tray title.
pub fn format_mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_mode_alternates_work_and_short_break() {
        assert_eq!(TimerMode::Work.next_after_completion(), TimerMode::ShortBreak);
        assert_eq!(TimerMode::ShortBreak.next_after_completion(), TimerMode::Work);
        assert_eq!(TimerMode::LongBreak.next_after_completion(), TimerMode::Work);
    }

    #[test]
    fn parses_cli_and_storage_spellings() {
        assert_eq!("short-break".parse::<TimerMode>().unwrap(), TimerMode::ShortBreak);
        assert_eq!("longBreak".parse::<TimerMode>().unwrap(), TimerMode::LongBreak);
        assert!("nap".parse::<TimerMode>().is_err());
    }

    #[test]
    fn serializes_with_session_table_names() {
        let json = serde_json::to_string(&TimerMode::ShortBreak).unwrap();
        assert_eq!(json, "\"shortBreak\"");
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mm_ss(1500), "25:00");
        assert_eq!(format_mm_ss(1453), "24:13");
        assert_eq!(format_mm_ss(9), "00:09");
        assert_eq!(format_mm_ss(0), "00:00");
    }

    #[test]
    fn breaks_share_a_sound() {
        assert_eq!(TimerMode::Work.sound_kind(), SoundKind::Work);
        assert_eq!(TimerMode::LongBreak.sound_kind(), SoundKind::Break);
    }
}
