//! Display state machine types.
//!
//! This module defines the mutually-exclusive view mode that governs which
//! producer may write the visible list, and what back-navigation does from
//! each mode.
//!
//! # State Machine
//!
//! The view is always in exactly one of three states:
//! - **Favorites**: the persisted favorite routes, hydrated for display
//! - **`SearchResults`**: airports matching the current non-blank query
//! - **Flights**: all destination routes from a picked departure airport
//!
//! Transitions are driven by input (blank → Favorites, non-blank →
//! `SearchResults`), selection (`SearchResults` → Flights), and back-navigation.
//! Both non-Favorites states unwind directly to Favorites — there is no
//! history stack, so leaving Flights never revisits the search results it was
//! entered from.

/// The single mutually-exclusive view mode.
///
/// Exactly one state is active at any time; it determines which producer
/// category owns the displayed list and how back-navigation unwinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// Persisted favorite routes. The initial state.
    Favorites,

    /// Airports matching the current search query.
    SearchResults,

    /// Destination routes from the selected departure airport.
    Flights,
}

impl DisplayState {
    /// Where back-navigation goes from this state.
    ///
    /// `None` means the application exits: backing out of Favorites ends the
    /// session. Both other states return to Favorites directly.
    #[must_use]
    pub const fn on_back(self) -> Option<Self> {
        match self {
            Self::Favorites => None,
            Self::SearchResults | Self::Flights => Some(Self::Favorites),
        }
    }
}
