//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Interval durations (minutes per mode)
//! - The rolling completed-work-session count
//! - Auto-start policy
//! - Notification and sound preferences
//! - Theme
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::settings::{AutoStartPolicy, DurationSettings, DEFAULT_LONG_BREAK_INTERVAL};
use crate::timer::TimerMode;

/// Work-session bookkeeping used by the break shortcut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default)]
    pub work_session_count: u32,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default)]
    pub auto_start: AutoStartPolicy,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Play the completion chime.
    #[serde(default = "default_true")]
    pub sound: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// UI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: Theme,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub durations: DurationSettings,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

fn default_true() -> bool {
    true
}
fn default_long_break_interval() -> u32 {
    DEFAULT_LONG_BREAK_INTERVAL
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            work_session_count: 0,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot replace a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default config file location.
    pub fn path() -> crate::error::Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is unavailable or the file
    /// exists but cannot be parsed.
    pub fn load() -> crate::error::Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Ok(Self::load_from(&path)?)
    }

    /// Parse the file at `path`. Out-of-range durations are clamped.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut cfg: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.durations = cfg.durations.clamped();
        Ok(cfg)
    }

    /// Load from `path`, returning defaults if it is missing or corrupt.
    pub fn load_from_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "falling back to default settings");
                Self::default()
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> crate::error::Result<()> {
        Ok(self.save_to(&Self::path()?)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// Duration keys accept any integer and are clamped to the mode's bounds;
    /// other keys must parse as the existing value's type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if let Some(mode) = Self::duration_key(key) {
            let minutes = value
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as minutes"),
                })?;
            self.durations.set(mode, minutes);
            return Ok(());
        }

        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn duration_key(key: &str) -> Option<TimerMode> {
        match key {
            "durations.work" => Some(TimerMode::Work),
            "durations.short_break" => Some(TimerMode::ShortBreak),
            "durations.long_break" => Some(TimerMode::LongBreak),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.durations, DurationSettings::default());
        assert_eq!(parsed.sessions.long_break_interval, 4);
        assert_eq!(parsed.timer.auto_start, AutoStartPolicy::AfterBreaks);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[durations]\nwork = 50\n").unwrap();
        assert_eq!(parsed.durations.work, 50);
        assert_eq!(parsed.durations.short_break, 5);
        assert!(parsed.notifications.enabled);
        assert_eq!(parsed.ui.theme, Theme::System);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("durations.work").as_deref(), Some("25"));
        assert_eq!(cfg.get("timer.auto_start").as_deref(), Some("after_breaks"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("ui.missing_key").is_none());
    }

    #[test]
    fn set_clamps_durations() {
        let mut cfg = Config::default();
        cfg.set("durations.work", "90").unwrap();
        assert_eq!(cfg.durations.work, 60);
        cfg.set("durations.short_break", "0").unwrap();
        assert_eq!(cfg.durations.short_break, 1);
        cfg.set("durations.long_break", "-3").unwrap();
        assert_eq!(cfg.durations.long_break, 1);
    }

    #[test]
    fn set_rejects_non_numeric_duration() {
        let mut cfg = Config::default();
        let err = cfg.set("durations.work", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.durations.work, 25);
    }

    #[test]
    fn set_updates_enums_and_bools() {
        let mut cfg = Config::default();
        cfg.set("timer.auto_start", "always").unwrap();
        assert_eq!(cfg.timer.auto_start, AutoStartPolicy::Always);
        cfg.set("ui.theme", "dark").unwrap();
        assert_eq!(cfg.ui.theme, Theme::Dark);
        cfg.set("notifications.sound", "false").unwrap();
        assert!(!cfg.notifications.sound);
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_enum() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("ui.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("timer.auto_start", "sometimes").is_err());
        assert!(cfg.set("notifications.enabled", "not_a_bool").is_err());
    }

    #[test]
    fn load_from_clamps_and_tolerates_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[durations]\nwork = 300\nshort_break = 0\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.durations.work, 60);
        assert_eq!(cfg.durations.short_break, 1);

        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(Config::load_from(&path).is_err());
        let cfg = Config::load_from_or_default(&path);
        assert_eq!(cfg.durations, DurationSettings::default());
    }

    #[test]
    fn save_to_then_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.sessions.work_session_count = 3;
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().sessions.work_session_count, 3);
    }
}
