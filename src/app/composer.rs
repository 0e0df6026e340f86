//! Route composition: destinations plus live favorite status.
//!
//! Given a departure airport, the composer publishes the list of routes to
//! every other known airport, then keeps each route's favorite flag current.
//! The list publishes immediately with provisional (`false`) flags so it
//! renders without waiting on the store; flags are eventual, delivered as
//! single-route patches by one status watcher per live route.
//!
//! The watcher fan-out is managed as an explicit registry keyed by route
//! identity and diffed on every destination-set emission: routes that survive
//! a reshape keep their existing watcher, removed routes get theirs cancelled,
//! only added routes subscribe fresh. Every watcher is a child of the
//! composer's own token, so tearing the composer down (leaving the flight
//! view) deterministically tears down the whole fan-out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app::updates::Update;
use crate::catalog::AirportCatalog;
use crate::domain::{Airport, Route, RouteKey};
use crate::storage::FavoriteStore;

/// Spawns the flight-list producer for `departure`.
///
/// Runs until cancelled or until the destination stream closes. A failure to
/// subscribe to the destination set is the one producer failure with a
/// user-visible notice: it publishes [`Update::FlightsFailed`] and exits.
pub(crate) fn spawn(
    departure: Airport,
    catalog: Arc<dyn AirportCatalog>,
    store: Arc<dyn FavoriteStore>,
    token: CancellationToken,
    generation: u64,
    updates: mpsc::Sender<Update>,
) {
    tokio::spawn(async move {
        tracing::debug!(
            departure = %departure.iata_code,
            generation,
            "composing routes"
        );

        let subscribed = tokio::select! {
            () = token.cancelled() => return,
            result = catalog.destinations_from(&departure.iata_code) => result,
        };

        let mut destinations = match subscribed {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    departure = %departure.iata_code,
                    "failed to load destinations"
                );
                let _ = updates
                    .send(Update::FlightsFailed {
                        generation,
                        message: format!("Error loading flights: {e}"),
                    })
                    .await;
                return;
            }
        };

        let mut watchers: HashMap<RouteKey, CancellationToken> = HashMap::new();

        loop {
            let snapshot = destinations.borrow_and_update().clone();
            let routes: Vec<Route> = snapshot
                .into_iter()
                .filter_map(|dest| Route::new(departure.clone(), dest))
                .collect();

            tracing::debug!(route_count = routes.len(), "publishing flight list");
            if updates
                .send(Update::Routes {
                    generation,
                    routes: routes.clone(),
                })
                .await
                .is_err()
            {
                return;
            }

            sync_watchers(
                &mut watchers,
                &routes,
                &store,
                &token,
                generation,
                &updates,
            );

            tokio::select! {
                () = token.cancelled() => return,
                changed = destinations.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

/// Diffs the watcher registry against the latest route list.
///
/// Stale watchers (route no longer present) are cancelled and dropped; new
/// routes get a fresh watcher. Surviving routes are untouched, so a reshape
/// never churns subscriptions for routes it kept.
fn sync_watchers(
    watchers: &mut HashMap<RouteKey, CancellationToken>,
    routes: &[Route],
    store: &Arc<dyn FavoriteStore>,
    parent: &CancellationToken,
    generation: u64,
    updates: &mpsc::Sender<Update>,
) {
    let current: HashSet<RouteKey> = routes.iter().map(Route::key).collect();

    watchers.retain(|key, watcher| {
        let keep = current.contains(key);
        if !keep {
            tracing::trace!(route = %key, "dropping stale favorite watcher");
            watcher.cancel();
        }
        keep
    });

    for route in routes {
        let key = route.key();
        if watchers.contains_key(&key) {
            continue;
        }

        let watcher = parent.child_token();
        watchers.insert(key.clone(), watcher.clone());
        spawn_watcher(key, store, watcher, generation, updates.clone());
    }
}

/// Spawns the favorite-status watcher for one route.
///
/// Sends the current flag immediately (this is what settles each route's
/// provisional `false`), then a patch for every subsequent change.
fn spawn_watcher(
    key: RouteKey,
    store: &Arc<dyn FavoriteStore>,
    token: CancellationToken,
    generation: u64,
    updates: mpsc::Sender<Update>,
) {
    let mut flag = store.is_favorite(&key.departure_code, &key.destination_code);

    tokio::spawn(async move {
        loop {
            let is_favorite = *flag.borrow_and_update();
            if updates
                .send(Update::RoutePatch {
                    generation,
                    key: key.clone(),
                    is_favorite,
                })
                .await
                .is_err()
            {
                return;
            }

            tokio::select! {
                () = token.cancelled() => return,
                changed = flag.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    });
}
