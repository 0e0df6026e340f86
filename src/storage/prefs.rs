//! Persisted user preferences.
//!
//! The only preference this core carries is the last raw search query: read
//! once at startup so a resumed session reopens with the same query and
//! resulting view, written on every keystroke. Writes are fire-and-forget —
//! a lost query is a cosmetic regression, never worth blocking input handling
//! or failing the session over.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::error::{FlightSearchError, Result};

const PREFS_VERSION: u32 = 1;

/// Process-wide persisted key/value preferences.
pub trait Preferences: Send + Sync {
    /// The last raw search query, blank if none was ever saved.
    fn last_query(&self) -> String;

    /// Saves the last raw search query, best-effort.
    ///
    /// Returns immediately; the write happens in the background and failures
    /// are logged, not surfaced.
    fn set_last_query(&self, query: &str);
}

/// On-disk container format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PrefsData {
    version: u32,

    #[serde(default)]
    last_query: String,
}

impl Default for PrefsData {
    fn default() -> Self {
        Self {
            version: PREFS_VERSION,
            last_query: String::new(),
        }
    }
}

struct Shared {
    file_path: PathBuf,

    /// Current data plus a monotonic write counter for dropping stale writes.
    data: Mutex<(PrefsData, u64)>,

    /// Serializes file writes; holds the counter of the last write that
    /// reached disk.
    io_lock: tokio::sync::Mutex<u64>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, (PrefsData, u64)> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn persist(&self, seq: u64) -> Result<()> {
        let mut last_written = self.io_lock.lock().await;
        if *last_written >= seq {
            return Ok(());
        }

        let data = self.lock().0.clone();
        let json = serde_json::to_string_pretty(&data).map_err(|e| {
            FlightSearchError::Storage(format!("failed to serialize preferences: {e}"))
        })?;

        let tmp_path = self.file_path.with_extension("tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.file_path).await?;

        *last_written = seq;
        Ok(())
    }
}

/// JSON file preferences backend, living beside the favorites file.
pub struct JsonPreferences {
    shared: Arc<Shared>,
}

impl JsonPreferences {
    /// Creates or opens the preferences file.
    ///
    /// A missing file starts with defaults. Unlike the favorites file, a
    /// corrupt preferences file is also replaced with defaults (with a
    /// warning): the stored query is throwaway data not worth failing
    /// startup over.
    ///
    /// # Errors
    ///
    /// Returns an error if parent directory creation fails or an existing
    /// file cannot be read.
    pub async fn open(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "initializing preferences");

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = if tokio::fs::try_exists(&file_path).await? {
            let contents = tokio::fs::read_to_string(&file_path).await?;
            match serde_json::from_str::<PrefsData>(&contents) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(error = %e, "corrupt preferences file, starting fresh");
                    PrefsData::default()
                }
            }
        } else {
            PrefsData::default()
        };

        Ok(Self {
            shared: Arc::new(Shared {
                file_path,
                data: Mutex::new((data, 0)),
                io_lock: tokio::sync::Mutex::new(0),
            }),
        })
    }

    /// Forces the current state to disk.
    ///
    /// Normal operation relies on the background writes from
    /// [`set_last_query`](Preferences::set_last_query); this exists for
    /// shutdown paths and tests that need a durability guarantee.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn flush(&self) -> Result<()> {
        let seq = {
            let mut guard = self.shared.lock();
            guard.1 += 1;
            guard.1
        };
        self.shared.persist(seq).await
    }
}

impl Preferences for JsonPreferences {
    fn last_query(&self) -> String {
        self.shared.lock().0.last_query.clone()
    }

    fn set_last_query(&self, query: &str) {
        let seq = {
            let mut guard = self.shared.lock();
            if guard.0.last_query == query {
                return;
            }
            guard.0.last_query = query.to_string();
            guard.1 += 1;
            guard.1
        };

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            if let Err(e) = shared.persist(seq).await {
                tracing::warn!(error = %e, "failed to persist search query");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_starts_blank() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = JsonPreferences::open(dir.path().join("preferences.json"))
            .await
            .unwrap();
        assert_eq!(prefs.last_query(), "");
    }

    #[tokio::test]
    async fn query_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let prefs = JsonPreferences::open(path.clone()).await.unwrap();
        prefs.set_last_query("JFK");
        prefs.flush().await.unwrap();

        let reopened = JsonPreferences::open(path).await.unwrap();
        assert_eq!(reopened.last_query(), "JFK");
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        tokio::fs::write(&path, "{broken").await.unwrap();

        let prefs = JsonPreferences::open(path).await.unwrap();
        assert_eq!(prefs.last_query(), "");
    }
}
