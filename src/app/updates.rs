//! Producer update protocol.
//!
//! Every asynchronous producer — search lookups, the route composer and its
//! per-route favorite watchers, the favorites producer, and toggle mutations —
//! reports back to the view state machine through a single channel of
//! [`Update`] values. The machine's apply loop is the only consumer, which is
//! what serializes all mutations of the displayed frame.
//!
//! Producer updates carry the generation their producer was started with; the
//! apply loop discards any update whose generation is no longer current. This
//! is a backstop on top of cooperative cancellation: a producer that loses a
//! race between its final send and its cancellation still cannot touch the
//! frame.

use crate::domain::{Airport, Route, RouteKey};

/// A message from a producer or mutation task to the apply loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Update {
    /// A search lookup emission: airports matching the query of `generation`.
    SearchResults {
        generation: u64,
        airports: Vec<Airport>,
    },

    /// A favorites producer emission: the hydrated favorite set.
    Favorites {
        generation: u64,
        routes: Vec<Route>,
    },

    /// A route composer emission: the provisional flight list.
    Routes {
        generation: u64,
        routes: Vec<Route>,
    },

    /// A single route's favorite flag, from a per-route status watcher.
    RoutePatch {
        generation: u64,
        key: RouteKey,
        is_favorite: bool,
    },

    /// The flight list could not be loaded; carries user-facing notice text.
    FlightsFailed {
        generation: u64,
        message: String,
    },

    /// A toggle mutation completed; patch the displayed item to this value.
    ///
    /// Not generation-tagged: a toggle is a user-initiated mutation ack, valid
    /// for whatever list currently shows the route.
    ToggleApplied {
        key: RouteKey,
        is_favorite: bool,
    },
}
