//! JSON file-based favorite store.
//!
//! This backend keeps the favorite set in memory and persists the whole set to
//! a JSON file on every mutation, using atomic writes (write-to-temp + rename)
//! to prevent corruption on crashes. Live queries are served from watch
//! channels updated synchronously with the in-memory set, so subscribers see a
//! mutation before (and regardless of whether) it reaches disk.
//!
//! # Performance Characteristics
//!
//! - **Read**: O(1) — the entire set lives in memory
//! - **Write**: O(n) — serializes and writes the whole set
//! - **Best for**: a personal favorites list, i.e. well under a thousand rows

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::domain::error::{FlightSearchError, Result};
use crate::domain::RouteKey;
use crate::live::Live;
use crate::storage::backend::FavoriteStore;
use crate::storage::models::FavoriteRecord;

/// Storage format version for future migrations.
const STORE_VERSION: u32 = 1;

/// On-disk container format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreData {
    version: u32,

    #[serde(default)]
    favorites: Vec<FavoriteRecord>,
}

/// Mutable state behind the store's lock.
///
/// The lock is never held across an await; mutations snapshot what they need
/// and persist after release.
struct Inner {
    records: BTreeMap<RouteKey, FavoriteRecord>,

    /// Lazily created per-route membership flags. A sender stays in the map
    /// once created and is updated on every mutation of its key, with or
    /// without live receivers.
    flags: HashMap<RouteKey, watch::Sender<bool>>,

    /// Monotonic mutation counter, used to drop stale persist attempts.
    seq: u64,
}

/// JSON file storage backend for favorite routes.
pub struct JsonFavoriteStore {
    file_path: PathBuf,
    inner: Mutex<Inner>,
    all_tx: watch::Sender<Vec<FavoriteRecord>>,

    /// Serializes file writes; holds the sequence number of the last snapshot
    /// that reached disk.
    io_lock: tokio::sync::Mutex<u64>,
}

impl JsonFavoriteStore {
    /// Creates or opens a JSON favorite store.
    ///
    /// If the file exists, loads existing data; otherwise starts empty. Parent
    /// directories are created automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if parent directory creation fails, the file cannot be
    /// read, or it contains invalid JSON. A broken favorites file is fatal at
    /// startup rather than silently discarded.
    pub async fn open(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "initializing favorite store");

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let records = if tokio::fs::try_exists(&file_path).await? {
            let contents = tokio::fs::read_to_string(&file_path).await?;
            let data: StoreData = serde_json::from_str(&contents).map_err(|e| {
                FlightSearchError::Storage(format!("failed to parse favorites: {e}"))
            })?;

            tracing::debug!(
                version = data.version,
                favorite_count = data.favorites.len(),
                "loaded favorites"
            );

            data.favorites
                .into_iter()
                .map(|record| (record.key(), record))
                .collect()
        } else {
            tracing::debug!("initializing empty favorite store");
            BTreeMap::new()
        };

        let (all_tx, _) = watch::channel(snapshot(&records));

        Ok(Self {
            file_path,
            inner: Mutex::new(Inner {
                records,
                flags: HashMap::new(),
                seq: 0,
            }),
            all_tx,
            io_lock: tokio::sync::Mutex::new(0),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes a snapshot to disk unless a newer one already got there.
    ///
    /// Writes go to a temporary file first and are renamed into place, so the
    /// file is never left half-written.
    async fn persist(&self, seq: u64, favorites: Vec<FavoriteRecord>) -> Result<()> {
        let mut last_written = self.io_lock.lock().await;
        if *last_written >= seq {
            tracing::trace!(seq, "skipping persist, newer snapshot already on disk");
            return Ok(());
        }

        let data = StoreData {
            version: STORE_VERSION,
            favorites,
        };
        let json = serde_json::to_string_pretty(&data).map_err(|e| {
            FlightSearchError::Storage(format!("failed to serialize favorites: {e}"))
        })?;

        let tmp_path = self.file_path.with_extension("tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.file_path).await?;

        *last_written = seq;
        tracing::debug!(seq, "favorites persisted");
        Ok(())
    }
}

/// Current set ordered by creation time, oldest favorite first.
fn snapshot(records: &BTreeMap<RouteKey, FavoriteRecord>) -> Vec<FavoriteRecord> {
    let mut favorites: Vec<FavoriteRecord> = records.values().cloned().collect();
    favorites.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.key().cmp(&b.key()))
    });
    favorites
}

#[async_trait::async_trait]
impl FavoriteStore for JsonFavoriteStore {
    fn all(&self) -> Live<Vec<FavoriteRecord>> {
        self.all_tx.subscribe()
    }

    fn is_favorite(&self, departure_code: &str, destination_code: &str) -> Live<bool> {
        let mut inner = self.lock();
        let key = RouteKey::new(departure_code, destination_code);
        let current = inner.records.contains_key(&key);

        inner
            .flags
            .entry(key)
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    async fn contains(&self, departure_code: &str, destination_code: &str) -> Result<bool> {
        let key = RouteKey::new(departure_code, destination_code);
        Ok(self.lock().records.contains_key(&key))
    }

    async fn add(&self, departure_code: &str, destination_code: &str) -> Result<()> {
        let pending = {
            let _span = tracing::debug_span!(
                "favorite_add",
                departure = %departure_code,
                destination = %destination_code
            )
            .entered();

            let mut inner = self.lock();
            let key = RouteKey::new(departure_code, destination_code);

            if inner.records.contains_key(&key) {
                tracing::debug!("favorite already present");
                None
            } else {
                let record = FavoriteRecord::new(departure_code, destination_code);
                inner.records.insert(key.clone(), record);
                inner.seq += 1;

                if let Some(flag) = inner.flags.get(&key) {
                    flag.send_replace(true);
                }

                Some((inner.seq, snapshot(&inner.records)))
            }
        };

        if let Some((seq, favorites)) = pending {
            self.all_tx.send_replace(favorites.clone());
            self.persist(seq, favorites).await?;
        }
        Ok(())
    }

    async fn remove(&self, departure_code: &str, destination_code: &str) -> Result<()> {
        let pending = {
            let _span = tracing::debug_span!(
                "favorite_remove",
                departure = %departure_code,
                destination = %destination_code
            )
            .entered();

            let mut inner = self.lock();
            let key = RouteKey::new(departure_code, destination_code);

            if inner.records.remove(&key).is_none() {
                tracing::debug!("favorite not present");
                None
            } else {
                inner.seq += 1;

                if let Some(flag) = inner.flags.get(&key) {
                    flag.send_replace(false);
                }

                Some((inner.seq, snapshot(&inner.records)))
            }
        };

        if let Some((seq, favorites)) = pending {
            self.all_tx.send_replace(favorites.clone());
            self.persist(seq, favorites).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_in(dir: &tempfile::TempDir) -> JsonFavoriteStore {
        JsonFavoriteStore::open(dir.path().join("favorites.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_then_is_favorite_emits_true_then_false_after_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir).await;

        let mut flag = store.is_favorite("JFK", "LAX");
        assert!(!*flag.borrow());

        store.add("JFK", "LAX").await.unwrap();
        flag.changed().await.unwrap();
        assert!(*flag.borrow());

        store.remove("JFK", "LAX").await.unwrap();
        flag.changed().await.unwrap();
        assert!(!*flag.borrow());
    }

    #[tokio::test]
    async fn all_reemits_on_every_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir).await;

        let mut all = store.all();
        assert!(all.borrow().is_empty());

        store.add("JFK", "LAX").await.unwrap();
        all.changed().await.unwrap();
        assert_eq!(all.borrow().len(), 1);

        store.add("JFK", "ORD").await.unwrap();
        all.changed().await.unwrap();
        let codes: Vec<String> = all
            .borrow()
            .iter()
            .map(|r| r.destination_code.clone())
            .collect();
        assert_eq!(codes, vec!["LAX", "ORD"]);

        store.remove("JFK", "LAX").await.unwrap();
        all.changed().await.unwrap();
        assert_eq!(all.borrow().len(), 1);
    }

    #[tokio::test]
    async fn mutations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir).await;

        store.add("JFK", "LAX").await.unwrap();
        store.add("JFK", "LAX").await.unwrap();
        assert_eq!(store.all().borrow().len(), 1);

        store.remove("JFK", "LAX").await.unwrap();
        store.remove("JFK", "LAX").await.unwrap();
        assert!(store.all().borrow().is_empty());
    }

    #[tokio::test]
    async fn favorites_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = open_in(&dir).await;
            store.add("JFK", "LAX").await.unwrap();
            store.add("ORD", "JFK").await.unwrap();
        }

        let reopened = open_in(&dir).await;
        assert!(reopened.contains("JFK", "LAX").await.unwrap());
        assert!(reopened.contains("ORD", "JFK").await.unwrap());
        assert!(!reopened.contains("LAX", "JFK").await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        assert!(JsonFavoriteStore::open(path).await.is_err());
    }
}
