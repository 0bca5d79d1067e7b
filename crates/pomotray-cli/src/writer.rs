//! Background session writer.
//!
//! The SQLite connection lives on a blocking task so a slow or failing disk
//! never holds up the timer loop. Saves are queued over a channel; failures
//! come back on a second channel for the loop to print as warnings.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pomotray_core::error::Result;
use pomotray_core::{Database, DatabaseError, SessionSink, TimerMode};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

struct SaveRequest {
    mode: TimerMode,
    duration_seconds: u64,
    completed_at: DateTime<Utc>,
}

/// Queue side, handed to the dispatcher as its session sink.
pub struct SessionWriter {
    requests: UnboundedSender<SaveRequest>,
}

/// Owner side: the worker task and its failure feed.
pub struct WriterHandle {
    task: JoinHandle<()>,
    failures: UnboundedReceiver<String>,
}

impl SessionWriter {
    /// Spawn the writer task on the current tokio runtime.
    pub fn spawn(path: PathBuf) -> (Self, WriterHandle) {
        let (req_tx, mut req_rx) = mpsc::unbounded_channel::<SaveRequest>();
        let (fail_tx, fail_rx) = mpsc::unbounded_channel::<String>();

        let task = tokio::task::spawn_blocking(move || {
            let db = Database::open_at(&path).map_err(|e| e.to_string());
            if let Err(e) = &db {
                tracing::warn!(path = %path.display(), error = %e, "session database unavailable");
            }
            while let Some(req) = req_rx.blocking_recv() {
                let result = match &db {
                    Ok(db) => db
                        .record_session(req.mode, req.duration_seconds, req.completed_at, true)
                        .map(|_| ())
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.clone()),
                };
                if let Err(message) = result {
                    tracing::warn!(mode = %req.mode, error = %message, "failed to save session");
                    let _ = fail_tx.send(message);
                }
            }
        });

        (
            Self { requests: req_tx },
            WriterHandle {
                task,
                failures: fail_rx,
            },
        )
    }
}

impl WriterHandle {
    /// Next reported failure, if any, without waiting.
    pub fn try_failure(&mut self) -> Option<String> {
        self.failures.try_recv().ok()
    }

    /// Wait for queued saves to finish. Every [`SessionWriter`] must be
    /// dropped first. Returns failures not yet drained.
    pub async fn finish(mut self) -> Vec<String> {
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "session writer task failed");
        }
        let mut remaining = Vec::new();
        while let Some(message) = self.try_failure() {
            remaining.push(message);
        }
        remaining
    }
}

impl SessionSink for SessionWriter {
    fn save_session(
        &mut self,
        mode: TimerMode,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.requests
            .send(SaveRequest {
                mode,
                duration_seconds,
                completed_at,
            })
            .map_err(|_| DatabaseError::WriterClosed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomotray_core::Period;

    #[tokio::test]
    async fn queued_saves_land_in_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pomotray.db");

        let (mut writer, handle) = SessionWriter::spawn(path.clone());
        writer.save_session(TimerMode::Work, 1500, Utc::now()).unwrap();
        writer.save_session(TimerMode::ShortBreak, 300, Utc::now()).unwrap();
        drop(writer);
        assert!(handle.finish().await.is_empty());

        let db = Database::open_at(&path).unwrap();
        let stats = db.stats(Period::All, Utc::now()).unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.work_sessions, 1);
    }

    #[tokio::test]
    async fn unopenable_database_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let (mut writer, handle) = SessionWriter::spawn(dir.path().to_path_buf());
        writer.save_session(TimerMode::Work, 1500, Utc::now()).unwrap();
        drop(writer);
        assert_eq!(handle.finish().await.len(), 1);
    }
}
