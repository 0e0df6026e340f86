//! Application layer: the reactive coordination core.
//!
//! This module implements the logic between the collaborators (catalog, store,
//! preferences) and the presentation boundary. It owns the single displayed
//! frame and the state machine governing which asynchronous producer may
//! write it.
//!
//! # Architecture
//!
//! ```text
//! User Input ──► Commands ──► ViewStateMachine ──► DisplayFrame (watch)
//!                                  ▲    │
//!                       Updates ───┘    └─► producer task groups
//!                          ▲                 (search / flights / favorites,
//!                          │                  one CancellationToken each)
//!                 QueryDebouncer · RouteComposer · favorites producer
//!                 FavoriteToggleController
//! ```
//!
//! Data flow: raw text → [`debouncer`] → catalog search → frame
//! (`SearchResults`); airport pick → [`composer`] (destinations + per-route
//! favorite watchers) → frame (`Flights`); blank input / back / startup →
//! favorites producer (store + airport hydration) → frame (`Favorites`);
//! favorite tap → [`toggle`] → store mutation → in-place frame patch.
//!
//! # Modules
//!
//! - [`modes`]: the three-state display mode and back-navigation
//! - [`state`]: the displayed frame and list types
//! - [`debouncer`]: cancellable, superseded-by-replacement lookups
//! - [`composer`]: route composition with live favorite flags
//! - [`toggle`]: per-route serialized favorite mutations
//! - [`machine`]: the actor owning the frame and the producer groups
//! - [`updates`]: the producer-to-machine message protocol

pub mod composer;
pub mod debouncer;
pub mod machine;
pub mod modes;
pub mod state;
pub mod toggle;
pub mod updates;

pub use machine::{Command, ViewHandle, ViewStateMachine};
pub use modes::DisplayState;
pub use state::{DisplayFrame, DisplayList, NO_FAVORITES_TEXT, NO_RESULTS_TEXT};
