//! The view state machine: single owner of the displayed frame.
//!
//! This module implements the actor that arbitrates which producer may write
//! the visible list. It runs one `tokio::select!` loop over two channels —
//! user commands in, producer updates in — and is the only code that mutates
//! the [`DisplayFrame`]. That single consumer is what the concurrency model
//! calls the logical UI thread: producers run anywhere, but their results are
//! applied here, in emission order, one at a time.
//!
//! # Producer groups
//!
//! Three producer categories exist (search, flights, favorites), each owning
//! a [`CancellationToken`] created fresh on state entry and cancelled on
//! exit. Entering a state cancels the groups not valid for it and publishes a
//! cleared frame before the new producer's first emission, so a stale mixture
//! of two producers' output is never visible. Every producer tags its updates
//! with the generation it was started under; the apply loop discards stale
//! generations as a backstop on top of cancellation.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::app::composer;
use crate::app::debouncer::{InputOutcome, QueryDebouncer};
use crate::app::modes::DisplayState;
use crate::app::state::{DisplayFrame, DisplayList, NO_FAVORITES_TEXT, NO_RESULTS_TEXT};
use crate::app::toggle::FavoriteToggleController;
use crate::app::updates::Update;
use crate::catalog::AirportCatalog;
use crate::domain::{Airport, Route, RouteKey};
use crate::storage::{FavoriteRecord, FavoriteStore, Preferences};

/// User intents fed into the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The raw search text changed (sent on every keystroke).
    Input(String),

    /// An airport was picked from the search results.
    ///
    /// Only honored while search results are displayed; selection from any
    /// other state is ignored by design.
    SelectAirport(Airport),

    /// The favorite affordance on a displayed route was tapped.
    ToggleFavorite(RouteKey),

    /// The delete affordance on a favorites-view item was tapped.
    DeleteFavorite(RouteKey),

    /// Back navigation. From Favorites this ends the session.
    Back,
}

/// Handle held by the presentation layer.
///
/// Cloneable; commands from all clones funnel into the one machine. When the
/// machine has exited (back from Favorites), sends are silently dropped.
#[derive(Clone)]
pub struct ViewHandle {
    commands: mpsc::Sender<Command>,
    frames: watch::Receiver<DisplayFrame>,
}

impl ViewHandle {
    /// Sends a command to the machine.
    pub async fn send(&self, command: Command) {
        if self.commands.send(command).await.is_err() {
            tracing::debug!("command dropped, machine has exited");
        }
    }

    /// Convenience for [`Command::Input`].
    pub async fn input(&self, text: &str) {
        self.send(Command::Input(text.to_string())).await;
    }

    /// Convenience for [`Command::SelectAirport`].
    pub async fn select_airport(&self, airport: Airport) {
        self.send(Command::SelectAirport(airport)).await;
    }

    /// Convenience for [`Command::ToggleFavorite`].
    pub async fn toggle_favorite(&self, key: RouteKey) {
        self.send(Command::ToggleFavorite(key)).await;
    }

    /// Convenience for [`Command::DeleteFavorite`].
    pub async fn delete_favorite(&self, key: RouteKey) {
        self.send(Command::DeleteFavorite(key)).await;
    }

    /// Convenience for [`Command::Back`].
    pub async fn back(&self) {
        self.send(Command::Back).await;
    }

    /// A live view of the displayed frame.
    #[must_use]
    pub fn frames(&self) -> watch::Receiver<DisplayFrame> {
        self.frames.clone()
    }
}

/// One producer category's cancellation scope and staleness tag.
struct ProducerGroup {
    token: CancellationToken,
    generation: u64,
}

impl ProducerGroup {
    fn new(root: &CancellationToken) -> Self {
        Self {
            token: root.child_token(),
            generation: 0,
        }
    }

    fn cancel(&self) {
        self.token.cancel();
    }

    /// Fresh token and generation for a new state entry.
    fn restart(&mut self, root: &CancellationToken, counter: &mut u64) -> (CancellationToken, u64) {
        self.token.cancel();
        self.token = root.child_token();
        (self.token.clone(), self.bump(counter))
    }

    /// New generation under the existing token (a superseding lookup within
    /// the same state entry).
    fn bump(&mut self, counter: &mut u64) -> u64 {
        *counter += 1;
        self.generation = *counter;
        self.generation
    }
}

/// The view state machine actor.
///
/// Constructed with [`ViewStateMachine::new`], then driven by awaiting
/// [`run`](ViewStateMachine::run) (typically on a spawned task). `run`
/// returns when the user backs out of Favorites or every handle is dropped;
/// the caller treats that as application exit.
pub struct ViewStateMachine {
    catalog: Arc<dyn AirportCatalog>,
    store: Arc<dyn FavoriteStore>,

    commands: mpsc::Receiver<Command>,
    updates_tx: mpsc::Sender<Update>,
    updates_rx: mpsc::Receiver<Update>,

    frame: DisplayFrame,
    frames: watch::Sender<DisplayFrame>,

    debouncer: QueryDebouncer,
    toggles: FavoriteToggleController,

    root: CancellationToken,
    search: ProducerGroup,
    flights: ProducerGroup,
    favorites: ProducerGroup,
    generations: u64,

    /// Query restored from preferences, replayed once at startup.
    initial_query: String,
}

impl ViewStateMachine {
    /// Creates the machine and its presentation handle.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn AirportCatalog>,
        store: Arc<dyn FavoriteStore>,
        prefs: Arc<dyn Preferences>,
    ) -> (Self, ViewHandle) {
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let (updates_tx, updates_rx) = mpsc::channel(256);

        let frame = DisplayFrame::initial();
        let (frames_tx, frames_rx) = watch::channel(frame.clone());

        let root = CancellationToken::new();
        let initial_query = prefs.last_query();

        let machine = Self {
            catalog: Arc::clone(&catalog),
            store: Arc::clone(&store),
            commands: commands_rx,
            updates_tx: updates_tx.clone(),
            updates_rx,
            frame,
            frames: frames_tx,
            debouncer: QueryDebouncer::new(catalog, prefs),
            toggles: FavoriteToggleController::new(store, updates_tx),
            search: ProducerGroup::new(&root),
            flights: ProducerGroup::new(&root),
            favorites: ProducerGroup::new(&root),
            root,
            generations: 0,
            initial_query,
        };

        let handle = ViewHandle {
            commands: commands_tx,
            frames: frames_rx,
        };

        (machine, handle)
    }

    /// Drives the machine until the session ends.
    ///
    /// Startup replays the restored query: a blank saved query opens
    /// Favorites, a non-blank one reopens the search it was saved from.
    pub async fn run(mut self) {
        let initial = self.initial_query.clone();
        match self.debouncer.on_input(&initial) {
            InputOutcome::Cleared => self.enter_favorites(),
            InputOutcome::Lookup(query) => self.enter_search(query),
        }

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle_command(command) {
                                break;
                            }
                        }
                        None => {
                            tracing::debug!("all handles dropped, shutting down");
                            break;
                        }
                    }
                }
                Some(update) = self.updates_rx.recv() => self.apply(update),
            }
        }

        self.root.cancel();
    }

    /// Processes one command. Returns `false` when the session should end.
    fn handle_command(&mut self, command: Command) -> bool {
        let _span = tracing::debug_span!("handle_command", command = ?command).entered();

        match command {
            Command::Input(text) => match self.debouncer.on_input(&text) {
                InputOutcome::Cleared => self.enter_favorites(),
                InputOutcome::Lookup(query) => self.enter_search(query),
            },
            Command::SelectAirport(airport) => {
                if self.frame.state == DisplayState::SearchResults {
                    self.enter_flights(airport);
                } else {
                    tracing::debug!(
                        code = %airport.iata_code,
                        state = ?self.frame.state,
                        "airport selection outside search results ignored"
                    );
                }
            }
            Command::ToggleFavorite(key) => self.toggles.toggle(key),
            Command::DeleteFavorite(key) => self.toggles.delete(key),
            Command::Back => match self.frame.state.on_back() {
                None => {
                    tracing::debug!("back from favorites, ending session");
                    return false;
                }
                Some(_) => self.enter_favorites(),
            },
        }
        true
    }

    fn enter_favorites(&mut self) {
        tracing::debug!("entering favorites");

        self.search.cancel();
        self.flights.cancel();
        self.debouncer.cancel_inflight();

        let (token, generation) = self.favorites.restart(&self.root, &mut self.generations);
        self.publish_cleared(DisplayState::Favorites);

        spawn_favorites_producer(
            Arc::clone(&self.catalog),
            Arc::clone(&self.store),
            token,
            generation,
            self.updates_tx.clone(),
        );
    }

    fn enter_search(&mut self, query: String) {
        tracing::debug!(query = %query, "entering search");

        self.flights.cancel();
        self.favorites.cancel();

        if self.frame.state != DisplayState::SearchResults {
            self.search.restart(&self.root, &mut self.generations);
            self.publish_cleared(DisplayState::SearchResults);
        }

        let generation = self.search.bump(&mut self.generations);
        let parent = self.search.token.clone();
        self.debouncer
            .start_lookup(query, &parent, generation, self.updates_tx.clone());
    }

    fn enter_flights(&mut self, departure: Airport) {
        tracing::debug!(departure = %departure.iata_code, "entering flights");

        self.search.cancel();
        self.favorites.cancel();
        self.debouncer.cancel_inflight();

        let (token, generation) = self.flights.restart(&self.root, &mut self.generations);
        self.publish_cleared(DisplayState::Flights);

        composer::spawn(
            departure,
            Arc::clone(&self.catalog),
            Arc::clone(&self.store),
            token,
            generation,
            self.updates_tx.clone(),
        );
    }

    /// Applies one producer update to the frame, or discards it as stale.
    fn apply(&mut self, update: Update) {
        match update {
            Update::SearchResults {
                generation,
                airports,
            } => {
                if self.frame.state != DisplayState::SearchResults
                    || generation != self.search.generation
                {
                    tracing::debug!(generation, "discarding stale search emission");
                    return;
                }
                let empty = airports.is_empty().then(|| NO_RESULTS_TEXT.to_string());
                self.publish(DisplayList::Airports(airports), empty, None);
            }
            Update::Favorites { generation, routes } => {
                if self.frame.state != DisplayState::Favorites
                    || generation != self.favorites.generation
                {
                    tracing::debug!(generation, "discarding stale favorites emission");
                    return;
                }
                let empty = routes.is_empty().then(|| NO_FAVORITES_TEXT.to_string());
                self.publish(DisplayList::Favorites(routes), empty, None);
            }
            Update::Routes { generation, routes } => {
                if self.frame.state != DisplayState::Flights
                    || generation != self.flights.generation
                {
                    tracing::debug!(generation, "discarding stale flight list emission");
                    return;
                }
                self.publish(DisplayList::Routes(routes), None, None);
            }
            Update::RoutePatch {
                generation,
                key,
                is_favorite,
            } => {
                if self.frame.state != DisplayState::Flights
                    || generation != self.flights.generation
                {
                    return;
                }
                if self.frame.list.patch_route(&key, is_favorite) {
                    self.republish();
                }
            }
            Update::FlightsFailed {
                generation,
                message,
            } => {
                if self.frame.state != DisplayState::Flights
                    || generation != self.flights.generation
                {
                    return;
                }
                self.publish(DisplayList::Routes(Vec::new()), None, Some(message));
            }
            Update::ToggleApplied { key, is_favorite } => {
                if self.frame.list.patch_route(&key, is_favorite) {
                    self.republish();
                }
            }
        }
    }

    /// Publishes a cleared frame for a freshly entered state.
    fn publish_cleared(&mut self, state: DisplayState) {
        self.frame.state = state;
        self.frame.list = DisplayList::cleared_for(state);
        self.frame.empty = None;
        self.frame.notice = None;
        self.republish();
    }

    fn publish(&mut self, list: DisplayList, empty: Option<String>, notice: Option<String>) {
        self.frame.list = list;
        self.frame.empty = empty;
        self.frame.notice = notice;
        self.republish();
    }

    fn republish(&mut self) {
        self.frame.revision += 1;
        self.frames.send_replace(self.frame.clone());
    }
}

/// Spawns the favorites producer: subscribes to the stored set and hydrates
/// every record's airports for display.
fn spawn_favorites_producer(
    catalog: Arc<dyn AirportCatalog>,
    store: Arc<dyn FavoriteStore>,
    token: CancellationToken,
    generation: u64,
    updates: mpsc::Sender<Update>,
) {
    tokio::spawn(async move {
        let mut all = store.all();

        loop {
            let records = all.borrow_and_update().clone();
            let routes = tokio::select! {
                () = token.cancelled() => return,
                routes = hydrate(&catalog, records) => routes,
            };

            if updates
                .send(Update::Favorites { generation, routes })
                .await
                .is_err()
            {
                return;
            }

            tokio::select! {
                () = token.cancelled() => return,
                changed = all.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

/// Hydrates favorite records into displayable routes.
///
/// Lookups run concurrently across records. A record whose airport is missing
/// from the catalog is skipped with a warning — not shown, not an error — and
/// lookup failures degrade the same way.
async fn hydrate(catalog: &Arc<dyn AirportCatalog>, records: Vec<FavoriteRecord>) -> Vec<Route> {
    let lookups = records.into_iter().map(|record| {
        let catalog = Arc::clone(catalog);
        async move {
            let departure = catalog.by_code(&record.departure_code).await;
            let destination = catalog.by_code(&record.destination_code).await;
            (record, departure, destination)
        }
    });

    let mut routes = Vec::new();
    for (record, departure, destination) in join_all(lookups).await {
        let (departure, destination) = match (departure, destination) {
            (Ok(Some(departure)), Ok(Some(destination))) => (departure, destination),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, route = %record.key(), "favorite hydration failed");
                continue;
            }
            _ => {
                tracing::warn!(route = %record.key(), "favorite references unknown airport, skipping");
                continue;
            }
        };

        match Route::new(departure, destination) {
            Some(mut route) => {
                route.is_favorite = true;
                routes.push(route);
            }
            None => {
                tracing::warn!(route = %record.key(), "favorite with identical endpoints, skipping");
            }
        }
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JsonCatalog;
    use crate::domain::error::{FlightSearchError, Result};
    use crate::live::Live;
    use crate::storage::{JsonFavoriteStore, JsonPreferences};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::task::JoinHandle;

    fn seed() -> Vec<Airport> {
        vec![
            Airport::new(1, "JFK", "John F. Kennedy International Airport"),
            Airport::new(2, "LAX", "Los Angeles International Airport"),
            Airport::new(3, "ORD", "O'Hare International Airport"),
        ]
    }

    struct Fixture {
        handle: ViewHandle,
        store: Arc<JsonFavoriteStore>,
        machine: JoinHandle<()>,
        _dir: tempfile::TempDir,
    }

    async fn fixture_with(catalog: Arc<dyn AirportCatalog>, last_query: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            JsonFavoriteStore::open(dir.path().join("favorites.json"))
                .await
                .unwrap(),
        );
        let prefs = Arc::new(
            JsonPreferences::open(dir.path().join("preferences.json"))
                .await
                .unwrap(),
        );
        if !last_query.is_empty() {
            prefs.set_last_query(last_query);
        }

        let (machine, handle) = ViewStateMachine::new(
            catalog,
            Arc::clone(&store) as Arc<dyn FavoriteStore>,
            prefs as Arc<dyn Preferences>,
        );
        let machine = tokio::spawn(machine.run());

        Fixture {
            handle,
            store,
            machine,
            _dir: dir,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(Arc::new(JsonCatalog::from_airports(seed()).unwrap()), "").await
    }

    /// Waits for the first frame satisfying `pred`.
    async fn frame_where<F>(frames: &mut watch::Receiver<DisplayFrame>, pred: F) -> DisplayFrame
    where
        F: Fn(&DisplayFrame) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let current = frames.borrow_and_update();
                    if pred(&current) {
                        return current.clone();
                    }
                }
                frames.changed().await.expect("frame channel closed");
            }
        })
        .await
        .expect("timed out waiting for frame")
    }

    fn airport_codes(frame: &DisplayFrame) -> Vec<String> {
        match &frame.list {
            DisplayList::Airports(airports) => {
                airports.iter().map(|a| a.iata_code.clone()).collect()
            }
            _ => panic!("expected airport list, got {:?}", frame.list),
        }
    }

    fn routes_of(frame: &DisplayFrame) -> Vec<Route> {
        match &frame.list {
            DisplayList::Routes(routes) | DisplayList::Favorites(routes) => routes.clone(),
            DisplayList::Airports(_) => panic!("expected routes, got airports"),
        }
    }

    #[tokio::test]
    async fn starts_in_favorites_with_empty_state_text() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::Favorites && f.empty.is_some()
        })
        .await;
        assert_eq!(frame.empty.as_deref(), Some(NO_FAVORITES_TEXT));
    }

    #[tokio::test]
    async fn nonblank_input_shows_matching_airports() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.handle.input("JF").await;
        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;
        assert_eq!(airport_codes(&frame), vec!["JFK"]);
        assert!(frame.empty.is_none());
    }

    #[tokio::test]
    async fn unmatched_search_shows_no_results_text() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.handle.input("ZZ").await;
        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && f.empty.is_some()
        })
        .await;
        assert!(frame.list.is_empty());
        assert_eq!(frame.empty.as_deref(), Some(NO_RESULTS_TEXT));
    }

    #[tokio::test]
    async fn blank_input_returns_to_favorites() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.handle.input("JF").await;
        frame_where(&mut frames, |f| f.state == DisplayState::SearchResults).await;

        fx.handle.input("").await;
        frame_where(&mut frames, |f| {
            f.state == DisplayState::Favorites && f.empty.is_some()
        })
        .await;
    }

    /// A catalog wrapper that blocks configured search fragments until
    /// released, for forcing lookup orderings.
    struct GatedCatalog {
        inner: JsonCatalog,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
    }

    impl GatedCatalog {
        fn new(inner: JsonCatalog) -> Self {
            Self {
                inner,
                gates: Mutex::new(HashMap::new()),
            }
        }

        fn gate(&self, fragment: &str) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(fragment.to_string(), Arc::clone(&gate));
            gate
        }
    }

    #[async_trait::async_trait]
    impl AirportCatalog for GatedCatalog {
        async fn search(&self, fragment: &str) -> Result<Live<Vec<Airport>>> {
            let gate = self.gates.lock().unwrap().get(fragment).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            self.inner.search(fragment).await
        }

        async fn by_code(&self, code: &str) -> Result<Option<Airport>> {
            self.inner.by_code(code).await
        }

        async fn destinations_from(&self, code: &str) -> Result<Live<Vec<Airport>>> {
            self.inner.destinations_from(code).await
        }
    }

    #[tokio::test]
    async fn superseded_lookup_never_overwrites_fresh_results() {
        let catalog = Arc::new(GatedCatalog::new(JsonCatalog::from_airports(seed()).unwrap()));
        let slow_gate = catalog.gate("J");

        let fx = fixture_with(Arc::clone(&catalog) as Arc<dyn AirportCatalog>, "").await;
        let mut frames = fx.handle.frames();

        // "J" hangs on its gate; "LA" supersedes it and resolves immediately.
        fx.handle.input("J").await;
        fx.handle.input("LA").await;

        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;
        assert_eq!(airport_codes(&frame), vec!["LAX"]);
        let settled_revision = frame.revision;

        // Release the stale lookup; its task was cancelled on supersession,
        // so the frame must not move.
        slow_gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(frames.borrow().revision, settled_revision);
        assert_eq!(airport_codes(&frames.borrow()), vec!["LAX"]);
    }

    #[tokio::test]
    async fn selecting_airport_composes_routes_with_eventual_flags() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.store.add("JFK", "ORD").await.unwrap();

        fx.handle.input("JF").await;
        frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;

        fx.handle
            .select_airport(Airport::new(1, "JFK", "John F. Kennedy International Airport"))
            .await;

        // All destinations except JFK itself, favorite flags converged.
        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::Flights
                && f.list.len() == 2
                && routes_of(f).iter().any(|r| r.is_favorite)
        })
        .await;

        let routes = routes_of(&frame);
        assert!(routes.iter().all(|r| r.departure.iata_code == "JFK"));
        assert!(routes.iter().all(|r| r.destination.iata_code != "JFK"));
        let favored: Vec<bool> = routes
            .iter()
            .map(|r| r.is_favorite)
            .collect();
        let codes: Vec<String> = routes
            .iter()
            .map(|r| r.destination.iata_code.clone())
            .collect();
        assert_eq!(codes, vec!["LAX", "ORD"]);
        assert_eq!(favored, vec![false, true]);
    }

    #[tokio::test]
    async fn selection_outside_search_results_is_ignored() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        frame_where(&mut frames, |f| {
            f.state == DisplayState::Favorites && f.empty.is_some()
        })
        .await;

        fx.handle
            .select_airport(Airport::new(1, "JFK", "John F. Kennedy International Airport"))
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(frames.borrow().state, DisplayState::Favorites);
    }

    #[tokio::test]
    async fn toggle_patches_displayed_route_in_place() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.handle.input("JF").await;
        frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;
        fx.handle
            .select_airport(Airport::new(1, "JFK", "John F. Kennedy International Airport"))
            .await;
        frame_where(&mut frames, |f| {
            f.state == DisplayState::Flights && f.list.len() == 2
        })
        .await;

        fx.handle.toggle_favorite(RouteKey::new("JFK", "LAX")).await;

        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::Flights
                && routes_of(f)
                    .iter()
                    .any(|r| r.key() == RouteKey::new("JFK", "LAX") && r.is_favorite)
        })
        .await;

        // The other route is untouched: a patch, not a reload.
        let routes = routes_of(&frame);
        assert_eq!(routes.len(), 2);
        assert!(!routes
            .iter()
            .find(|r| r.destination.iata_code == "ORD")
            .unwrap()
            .is_favorite);
        assert!(fx.store.contains("JFK", "LAX").await.unwrap());
    }

    #[tokio::test]
    async fn double_toggle_restores_prior_membership() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.handle.input("JF").await;
        frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;
        fx.handle
            .select_airport(Airport::new(1, "JFK", "John F. Kennedy International Airport"))
            .await;
        let settled = frame_where(&mut frames, |f| {
            f.state == DisplayState::Flights && f.list.len() == 2
        })
        .await;
        let rev0 = settled.revision;

        let key = RouteKey::new("JFK", "LAX");
        // Two taps before the first mutation settles: serialized per key, so
        // they must net out to no change. The flag flips twice (on, then off),
        // bumping the revision exactly twice.
        fx.handle.toggle_favorite(key.clone()).await;
        fx.handle.toggle_favorite(key.clone()).await;

        frame_where(&mut frames, |f| {
            f.state == DisplayState::Flights
                && f.revision >= rev0 + 2
                && routes_of(f).iter().any(|r| r.key() == key && !r.is_favorite)
        })
        .await;

        assert!(!fx.store.contains("JFK", "LAX").await.unwrap());
    }

    #[tokio::test]
    async fn back_from_flights_shows_hydrated_favorites() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.store.add("JFK", "LAX").await.unwrap();

        fx.handle.input("JF").await;
        frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;
        fx.handle
            .select_airport(Airport::new(1, "JFK", "John F. Kennedy International Airport"))
            .await;
        frame_where(&mut frames, |f| f.state == DisplayState::Flights).await;

        fx.handle.back().await;
        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::Favorites && !f.list.is_empty()
        })
        .await;

        let favorites = routes_of(&frame);
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].departure.name, "John F. Kennedy International Airport");
        assert_eq!(favorites[0].destination.name, "Los Angeles International Airport");
        assert!(favorites[0].is_favorite);
    }

    #[tokio::test]
    async fn back_from_favorites_ends_the_session() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        frame_where(&mut frames, |f| {
            f.state == DisplayState::Favorites && f.empty.is_some()
        })
        .await;

        fx.handle.back().await;
        tokio::time::timeout(Duration::from_secs(5), fx.machine)
            .await
            .expect("machine did not exit")
            .unwrap();
    }

    #[tokio::test]
    async fn deleting_a_favorite_refreshes_the_view() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.store.add("JFK", "LAX").await.unwrap();
        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::Favorites && !f.list.is_empty()
        })
        .await;
        assert_eq!(routes_of(&frame).len(), 1);

        fx.handle.delete_favorite(RouteKey::new("JFK", "LAX")).await;
        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::Favorites && f.empty.is_some()
        })
        .await;
        assert_eq!(frame.empty.as_deref(), Some(NO_FAVORITES_TEXT));
    }

    #[tokio::test]
    async fn favorite_with_unknown_airport_is_dropped_from_display() {
        let fx = fixture().await;
        let mut frames = fx.handle.frames();

        fx.store.add("JFK", "LAX").await.unwrap();
        fx.store.add("JFK", "ZZZ").await.unwrap();

        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::Favorites && !f.list.is_empty()
        })
        .await;

        let favorites = routes_of(&frame);
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].destination.iata_code, "LAX");
    }

    #[tokio::test]
    async fn restored_query_reopens_search_results() {
        let catalog: Arc<dyn AirportCatalog> =
            Arc::new(JsonCatalog::from_airports(seed()).unwrap());
        let fx = fixture_with(catalog, "LA").await;
        let mut frames = fx.handle.frames();

        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;
        assert_eq!(airport_codes(&frame), vec!["LAX"]);
    }

    /// A catalog whose destination query always fails.
    struct BrokenDestinations {
        inner: JsonCatalog,
    }

    #[async_trait::async_trait]
    impl AirportCatalog for BrokenDestinations {
        async fn search(&self, fragment: &str) -> Result<Live<Vec<Airport>>> {
            self.inner.search(fragment).await
        }

        async fn by_code(&self, code: &str) -> Result<Option<Airport>> {
            self.inner.by_code(code).await
        }

        async fn destinations_from(&self, _code: &str) -> Result<Live<Vec<Airport>>> {
            Err(FlightSearchError::Catalog("destinations unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn flights_load_failure_raises_a_notice() {
        let catalog: Arc<dyn AirportCatalog> = Arc::new(BrokenDestinations {
            inner: JsonCatalog::from_airports(seed()).unwrap(),
        });
        let fx = fixture_with(catalog, "").await;
        let mut frames = fx.handle.frames();

        fx.handle.input("JF").await;
        frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;
        fx.handle
            .select_airport(Airport::new(1, "JFK", "John F. Kennedy International Airport"))
            .await;

        let frame = frame_where(&mut frames, |f| {
            f.state == DisplayState::Flights && f.notice.is_some()
        })
        .await;
        assert!(frame.list.is_empty());
        assert!(frame.notice.unwrap().contains("Error loading flights"));
    }

    #[tokio::test]
    async fn state_entry_clears_the_list_before_the_producer_emits() {
        let catalog = Arc::new(GatedCatalog::new(JsonCatalog::from_airports(seed()).unwrap()));
        let _gate = catalog.gate("LA");

        let fx = fixture_with(Arc::clone(&catalog) as Arc<dyn AirportCatalog>, "").await;
        let mut frames = fx.handle.frames();

        fx.handle.input("JF").await;
        frame_where(&mut frames, |f| {
            f.state == DisplayState::SearchResults && !f.list.is_empty()
        })
        .await;

        // "LA" never resolves (its gate stays shut); switching to favorites
        // and back shows the machine cleared the old results immediately.
        fx.handle.input("").await;
        frame_where(&mut frames, |f| f.state == DisplayState::Favorites).await;

        fx.handle.input("LA").await;
        let frame = frame_where(&mut frames, |f| f.state == DisplayState::SearchResults).await;
        assert!(frame.list.is_empty());
        assert!(frame.empty.is_none());
    }
}
