//! Flightsearch: a reactive airport search and favorite-routes core.
//!
//! This crate implements the coordination layer of a flight search session:
//! - Live airport search with cancel-on-supersede lookups (a stale query's
//!   results can never overwrite a fresher query's)
//! - Route composition from a picked departure airport, each route carrying a
//!   live favorite flag patched in place as the store changes
//! - A three-state view machine (Favorites / SearchResults / Flights) where
//!   exactly one producer may write the displayed list at a time
//! - A persisted favorite-routes set and a persisted last search query, so a
//!   resumed session reopens where it left off
//!
//! It is a library with no rendering and no CLI: the presentation layer
//! subscribes to a watch channel of [`DisplayFrame`](app::DisplayFrame)
//! snapshots and feeds user intents back as [`Command`](app::Command)s.
//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Embedder (UI toolkit, TUI, tests)                  │  ← presentation
//! └─────────────────────────────────────────────────────┘
//!            │ commands                 ▲ display frames
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← state machine
//! │  - View state machine and apply loop                │
//! │  - Query debouncing by supersession                 │
//! │  - Route composition + favorite watchers            │
//! │  - Per-route toggle serialization                   │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Catalog Layer │   │ Storage Layer │   │ Live queries  │
//! │ (catalog/)    │   │ (storage/)    │   │ (live.rs)     │
//! │ - JSON seed   │   │ - favorites   │   │ - watch-based │
//! │ - live search │   │ - preferences │   │   derivation  │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain & Infrastructure                            │
//! │  - Airport/Route models, error types (domain/)      │
//! │  - Data directory resolution (infrastructure/)      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: view state machine, debouncer, composer, toggle controller
//! - [`catalog`]: airport lookup trait and JSON-seeded backend
//! - [`storage`]: favorite store, preferences, storage records
//! - [`domain`]: core types and the error taxonomy
//! - [`live`]: live (re-emitting) query plumbing
//! - [`infrastructure`]: platform path defaults
//! - [`observability`]: tracing subscriber setup
//!
//! # Usage
//!
//! ```no_run
//! use flightsearch::{initialize, Config};
//!
//! # async fn demo() -> flightsearch::domain::Result<()> {
//! let config = Config {
//!     catalog_path: Some("airports.json".into()),
//!     ..Config::default()
//! };
//!
//! let app = initialize(&config).await?;
//! let mut frames = app.frames();
//!
//! app.handle().input("JF").await;
//! frames.changed().await.ok();
//! println!("{:?}", frames.borrow().list);
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Model
//!
//! Only [`initialize`] can fail the session (storage or seed unavailable at
//! startup). Every runtime failure — a lookup error, a favorite that
//! references an airport the catalog no longer knows, a persistence error —
//! is logged and degraded: an empty list, a skipped row, or a transient
//! notice on the flight view. Producers never crash the state machine.

pub mod app;
pub mod catalog;
pub mod domain;
pub mod infrastructure;
pub mod live;
pub mod observability;
pub mod storage;

pub use app::{Command, DisplayFrame, DisplayList, DisplayState, ViewHandle, ViewStateMachine};
pub use domain::{Airport, FlightSearchError, Result, Route, RouteKey};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::catalog::JsonCatalog;
use crate::storage::{JsonFavoriteStore, JsonPreferences};

/// Crate configuration.
///
/// Built programmatically or parsed from a TOML file:
///
/// ```toml
/// catalog_path = "/usr/share/flightsearch/airports.json"
/// data_dir = "/home/user/.local/share/flightsearch"
/// trace_level = "debug"
/// log_file = "/tmp/flightsearch.log"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the airport catalog seed file.
    ///
    /// Defaults to `airports.json` inside the data directory.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Directory for persisted state (favorites, preferences).
    ///
    /// Defaults to the platform data directory, see
    /// [`infrastructure::default_data_dir`].
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Tracing level when `RUST_LOG` is not set.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`.
    #[serde(default)]
    pub trace_level: Option<String>,

    /// Log file path; stderr when unset.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Parses configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this structure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&contents)
            .map_err(|e| FlightSearchError::Config(format!("invalid config file: {e}")))
    }

    /// The resolved data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(infrastructure::default_data_dir)
    }

    /// The resolved catalog seed path.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| self.data_dir().join("airports.json"))
    }
}

/// A running flight search session.
///
/// Created by [`initialize`]. The machine runs on a spawned task until the
/// user backs out of the favorites view; [`join`](Self::join) awaits that
/// exit.
pub struct FlightSearchApp {
    handle: ViewHandle,
    machine: JoinHandle<()>,
}

impl FlightSearchApp {
    /// The command/frame handle for the presentation layer.
    #[must_use]
    pub fn handle(&self) -> ViewHandle {
        self.handle.clone()
    }

    /// A live view of the displayed frame.
    #[must_use]
    pub fn frames(&self) -> watch::Receiver<DisplayFrame> {
        self.handle.frames()
    }

    /// Waits for the session to end (back-navigation out of Favorites).
    pub async fn join(self) {
        let _ = self.machine.await;
    }
}

/// Initializes storage, catalog, and the view state machine.
///
/// This is the session entry point: it wires the JSON-backed collaborators to
/// a [`ViewStateMachine`], spawns its run loop, and returns the handle. The
/// restored last query decides the opening view (blank → Favorites, non-blank
/// → that search).
///
/// # Errors
///
/// Returns an error if the catalog seed cannot be loaded or the storage layer
/// fails to open. These are the only fatal failures in the crate; callers
/// surface them and exit.
pub async fn initialize(config: &Config) -> Result<FlightSearchApp> {
    observability::init_tracing(config);
    tracing::debug!("initializing flight search core");

    let data_dir = config.data_dir();

    let catalog = Arc::new(JsonCatalog::open(config.catalog_path()).await?);
    let store = Arc::new(JsonFavoriteStore::open(data_dir.join("favorites.json")).await?);
    let prefs = Arc::new(JsonPreferences::open(data_dir.join("preferences.json")).await?);

    let (machine, handle) = ViewStateMachine::new(catalog, store, prefs);
    let machine = tokio::spawn(machine.run());

    Ok(FlightSearchApp { handle, machine })
}
