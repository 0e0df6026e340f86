//! Favorite toggling, serialized per route.
//!
//! A toggle is a read-then-write: read the current membership, then add or
//! remove. Two rapid toggles on the same route must not interleave those
//! halves — an unguarded pair of taps can read the same snapshot twice and
//! issue a duplicate insert or delete. Each route key therefore owns an async
//! mutex; concurrent toggles on one key queue behind it, while toggles on
//! different keys proceed independently.
//!
//! On completion the controller reports the new flag to the apply loop, which
//! patches the displayed item in place. Deletion from the favorites view takes
//! the removal path only: the store's live `all()` re-emits and the favorites
//! producer refreshes the view on its own.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::app::updates::Update;
use crate::domain::RouteKey;
use crate::storage::FavoriteStore;

/// Serializes favorite mutations per route and reconciles the displayed flag.
pub(crate) struct FavoriteToggleController {
    store: Arc<dyn FavoriteStore>,
    updates: mpsc::Sender<Update>,

    /// One async mutex per route key ever toggled. Bounded by the set of
    /// routes the user actually touches, so the map is never pruned.
    locks: Mutex<HashMap<RouteKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl FavoriteToggleController {
    pub(crate) fn new(store: Arc<dyn FavoriteStore>, updates: mpsc::Sender<Update>) -> Self {
        Self {
            store,
            updates,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, key: &RouteKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Toggles the favorite status of a route.
    ///
    /// Spawned; returns immediately. Under the route's lock: a point-in-time
    /// membership read decides between add and remove, and only a successful
    /// mutation reports [`Update::ToggleApplied`]. Failures are logged and
    /// leave the displayed flag untouched.
    pub(crate) fn toggle(&self, key: RouteKey) {
        let store = Arc::clone(&self.store);
        let updates = self.updates.clone();
        let lock = self.lock_for(&key);

        tokio::spawn(async move {
            let _guard = lock.lock().await;

            let favored = match store
                .contains(&key.departure_code, &key.destination_code)
                .await
            {
                Ok(favored) => favored,
                Err(e) => {
                    tracing::warn!(error = %e, route = %key, "favorite status read failed");
                    return;
                }
            };

            let result = if favored {
                store
                    .remove(&key.departure_code, &key.destination_code)
                    .await
            } else {
                store.add(&key.departure_code, &key.destination_code).await
            };

            match result {
                Ok(()) => {
                    tracing::debug!(route = %key, is_favorite = !favored, "favorite toggled");
                    let _ = updates
                        .send(Update::ToggleApplied {
                            key,
                            is_favorite: !favored,
                        })
                        .await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, route = %key, "favorite toggle failed");
                }
            }
        });
    }

    /// Removes a favorite (favorites-view delete affordance).
    ///
    /// No explicit list surgery: the store's live `all()` re-emission causes
    /// the favorites view to refresh.
    pub(crate) fn delete(&self, key: RouteKey) {
        let store = Arc::clone(&self.store);
        let lock = self.lock_for(&key);

        tokio::spawn(async move {
            let _guard = lock.lock().await;

            if let Err(e) = store
                .remove(&key.departure_code, &key.destination_code)
                .await
            {
                tracing::warn!(error = %e, route = %key, "favorite delete failed");
            } else {
                tracing::debug!(route = %key, "favorite deleted");
            }
        });
    }
}
