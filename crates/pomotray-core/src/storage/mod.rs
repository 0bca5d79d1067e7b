mod config;
pub mod database;

pub use config::{Config, NotificationsConfig, SessionsConfig, Theme, TimerConfig, UiConfig};
pub use database::{Database, Period, SessionRecord, Stats};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `POMOTRAY_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/pomotray[-dev]/`, with `POMOTRAY_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> crate::error::Result<PathBuf> {
    let dir = match std::env::var_os("POMOTRAY_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOTRAY_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomotray-dev")
            } else {
                base_dir.join("pomotray")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
