//! Query debouncing by supersession.
//!
//! Raw text input arrives on every keystroke. This component turns that stream
//! into effective lookups: each new input cancels the lookup already in
//! flight, so only the most recently started lookup can ever deliver results.
//! There is no timer — debouncing here means *supersession*, matching a
//! search-as-you-type flow where an outdated query's results are worthless
//! the moment a newer query exists.
//!
//! The race this guards against: a slow lookup for "A" resolving after a fast
//! lookup for "AB" must not overwrite the fresh results. Cancellation stops
//! the stale task at its next suspension point; the apply loop's generation
//! check discards anything it managed to send first.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app::updates::Update;
use crate::catalog::AirportCatalog;
use crate::storage::Preferences;

/// The effect of one input event, as seen by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputOutcome {
    /// Input was blank: the view should switch to favorites.
    Cleared,

    /// Input was non-blank: start a lookup for this query.
    Lookup(String),
}

/// Turns raw text input into cancellable, superseded-by-replacement lookups.
pub(crate) struct QueryDebouncer {
    catalog: Arc<dyn AirportCatalog>,
    prefs: Arc<dyn Preferences>,

    /// Token of the lookup currently in flight, if any.
    inflight: Option<CancellationToken>,
}

impl QueryDebouncer {
    pub(crate) fn new(catalog: Arc<dyn AirportCatalog>, prefs: Arc<dyn Preferences>) -> Self {
        Self {
            catalog,
            prefs,
            inflight: None,
        }
    }

    /// Registers a new raw input value.
    ///
    /// Persists the raw text (best-effort), cancels any in-flight lookup —
    /// whatever the new input is, the old lookup is superseded — and reports
    /// whether the machine should clear to favorites or start a lookup.
    pub(crate) fn on_input(&mut self, raw: &str) -> InputOutcome {
        self.prefs.set_last_query(raw);
        self.cancel_inflight();

        if raw.trim().is_empty() {
            tracing::debug!("blank query");
            InputOutcome::Cleared
        } else {
            InputOutcome::Lookup(raw.to_string())
        }
    }

    /// Starts the lookup for an effective query.
    ///
    /// The lookup task runs as a child of `parent` (the search task group), so
    /// leaving the search state cancels it along with everything else; typing
    /// again cancels it through [`on_input`](Self::on_input). It subscribes to
    /// the catalog's live search and forwards every emission tagged with
    /// `generation`. Lookup errors degrade to one empty emission.
    pub(crate) fn start_lookup(
        &mut self,
        query: String,
        parent: &CancellationToken,
        generation: u64,
        updates: mpsc::Sender<Update>,
    ) {
        let token = parent.child_token();
        self.inflight = Some(token.clone());

        let catalog = Arc::clone(&self.catalog);
        tokio::spawn(async move {
            tracing::debug!(query = %query, generation, "starting airport lookup");

            let subscribed = tokio::select! {
                () = token.cancelled() => return,
                result = catalog.search(&query) => result,
            };

            let mut results = match subscribed {
                Ok(live) => live,
                Err(e) => {
                    tracing::warn!(error = %e, query = %query, "airport lookup failed");
                    let _ = updates
                        .send(Update::SearchResults {
                            generation,
                            airports: Vec::new(),
                        })
                        .await;
                    return;
                }
            };

            loop {
                let airports = results.borrow_and_update().clone();
                tracing::debug!(
                    query = %query,
                    match_count = airports.len(),
                    "lookup emission"
                );
                if updates
                    .send(Update::SearchResults {
                        generation,
                        airports,
                    })
                    .await
                    .is_err()
                {
                    return;
                }

                tokio::select! {
                    () = token.cancelled() => return,
                    changed = results.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }
        });
    }

    /// Cancels the in-flight lookup, if any.
    pub(crate) fn cancel_inflight(&mut self) {
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }
    }
}
