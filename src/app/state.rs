//! The displayed frame: the rendering-agnostic output of the core.
//!
//! The presentation layer subscribes to a watch channel of [`DisplayFrame`]
//! values and renders whatever the latest frame says: the current
//! [`DisplayState`], a typed ordered list, optional empty-state text, and an
//! optional transient notice. Frames are complete snapshots — a renderer needs
//! no history to draw one — but list items keep their identity
//! ([`RouteKey`]) across frames so a diffing renderer can update single rows.

use crate::app::modes::DisplayState;
use crate::domain::{Airport, Route, RouteKey};

/// Empty-state text for a search that matched nothing.
pub const NO_RESULTS_TEXT: &str = "No results found";

/// Empty-state text for an empty favorites set.
pub const NO_FAVORITES_TEXT: &str = "No favorite routes yet";

/// The displayed list, typed by what kind of items the active state shows.
///
/// Favorites are hydrated [`Route`] values with `is_favorite = true`; the
/// variant is kept separate from `Routes` because the two views carry
/// different affordances (delete vs. toggle) at the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayList {
    /// Airport suggestions (search results).
    Airports(Vec<Airport>),

    /// Destination routes from the selected departure (flight list).
    Routes(Vec<Route>),

    /// Hydrated favorite routes.
    Favorites(Vec<Route>),
}

impl DisplayList {
    /// The empty list variant appropriate for `state`.
    #[must_use]
    pub fn cleared_for(state: DisplayState) -> Self {
        match state {
            DisplayState::Favorites => Self::Favorites(Vec::new()),
            DisplayState::SearchResults => Self::Airports(Vec::new()),
            DisplayState::Flights => Self::Routes(Vec::new()),
        }
    }

    /// Number of displayed items.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Airports(items) => items.len(),
            Self::Routes(items) | Self::Favorites(items) => items.len(),
        }
    }

    /// Whether the list has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Patches the favorite flag of the route identified by `key`, in place.
    ///
    /// Returns `true` if an item was found and its flag actually changed.
    /// Lists without route items are left untouched.
    pub(crate) fn patch_route(&mut self, key: &RouteKey, is_favorite: bool) -> bool {
        let routes = match self {
            Self::Routes(routes) | Self::Favorites(routes) => routes,
            Self::Airports(_) => return false,
        };

        for route in routes.iter_mut() {
            if route.key() == *key && route.is_favorite != is_favorite {
                route.is_favorite = is_favorite;
                return true;
            }
        }
        false
    }
}

/// A complete snapshot of what the view should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    /// The active view mode.
    pub state: DisplayState,

    /// The displayed list. Cleared on every state entry before the new
    /// producer's first emission, so a stale mixture is never visible.
    pub list: DisplayList,

    /// Empty-state text, set only after a producer delivered an empty result.
    /// `None` while a list is loading or non-empty.
    pub empty: Option<String>,

    /// Transient non-blocking notification text (flight-load failures only).
    pub notice: Option<String>,

    /// Monotonic publish counter, increments on every frame.
    pub revision: u64,
}

impl DisplayFrame {
    /// The frame shown before any producer has run: empty Favorites, loading.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            state: DisplayState::Favorites,
            list: DisplayList::cleared_for(DisplayState::Favorites),
            empty: None,
            notice: None,
            revision: 0,
        }
    }
}
