//! Autocomplete lookups, gated on input length and run apart from the main
//! search.

use std::{sync::Arc, time::Duration};

use shared::{AutocompleteResponse, PartialSearchState};
use tracing::{debug, warn};

use crate::{sequence::FetchKind, DriverCore, DriverError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocompleteKind {
    Results,
    Suggestions,
}

impl AutocompleteKind {
    pub fn fetch_kind(self) -> FetchKind {
        match self {
            Self::Results => FetchKind::AutocompleteResults,
            Self::Suggestions => FetchKind::AutocompleteSuggestions,
        }
    }

    /// Transition that empties this kind's state field.
    pub(crate) fn cleared(self) -> PartialSearchState {
        match self {
            Self::Results => PartialSearchState {
                autocompleted_results: Some(Vec::new()),
                autocompleted_results_request_id: Some(String::new()),
                ..PartialSearchState::default()
            },
            Self::Suggestions => PartialSearchState {
                autocompleted_suggestions: Some(Default::default()),
                autocompleted_suggestions_request_id: Some(String::new()),
                ..PartialSearchState::default()
            },
        }
    }

    /// Also clears `error`, which holds the latest connector failure of any kind.
    fn completed(self, response: AutocompleteResponse) -> PartialSearchState {
        let request_id = response.request_id.unwrap_or_default();
        match self {
            Self::Results => PartialSearchState {
                autocompleted_results: Some(response.results.unwrap_or_default()),
                autocompleted_results_request_id: Some(request_id),
                error: Some(String::new()),
                ..PartialSearchState::default()
            },
            Self::Suggestions => PartialSearchState {
                autocompleted_suggestions: Some(response.suggestions.unwrap_or_default()),
                autocompleted_suggestions_request_id: Some(request_id),
                error: Some(String::new()),
                ..PartialSearchState::default()
            },
        }
    }
}

impl DriverCore {
    /// Schedules a lookup for `kind` unless `term` is shorter than
    /// `minimum_characters`. A short term leaves the state alone but cancels a
    /// lookup still waiting on its debounce for an earlier, longer term.
    pub(crate) fn request_autocomplete(
        self: &Arc<Self>,
        kind: AutocompleteKind,
        term: &str,
        debounce: Duration,
        minimum_characters: usize,
    ) {
        let length = term.chars().count();
        if length < minimum_characters {
            debug!(
                "autocomplete: below minimum kind={kind:?} length={length} minimum={minimum_characters}"
            );
            self.scheduler.cancel(kind.fetch_kind().debounce_key());
            return;
        }

        let core = Arc::downgrade(self);
        let term = term.to_string();
        self.scheduler
            .schedule(kind.fetch_kind().debounce_key(), debounce, move || {
                if let Some(core) = core.upgrade() {
                    core.start_autocomplete(kind, term);
                }
            });
    }

    /// Drops pending and in-flight lookups of `kind` so nothing repopulates a
    /// field the caller stopped asking for.
    pub(crate) fn discard_autocomplete(&self, kind: AutocompleteKind) {
        self.scheduler.cancel(kind.fetch_kind().debounce_key());
        self.sequencer.issue(kind.fetch_kind());
    }

    fn start_autocomplete(self: &Arc<Self>, kind: AutocompleteKind, term: String) {
        if self.is_closed() {
            return;
        }
        let sequence = self.sequencer.issue(kind.fetch_kind());
        let query_config = match kind {
            AutocompleteKind::Results => self.autocomplete_query.results_only(),
            AutocompleteKind::Suggestions => self.autocomplete_query.suggestions_only(),
        };
        debug!("autocomplete: issuing request kind={kind:?} sequence={sequence} term={term:?}");

        let core = Arc::clone(self);
        self.runtime.spawn(async move {
            let outcome = core.connector.autocomplete(&term, &query_config).await;
            core.finish_autocomplete(kind, sequence, outcome);
        });
    }

    fn finish_autocomplete(
        &self,
        kind: AutocompleteKind,
        sequence: u64,
        outcome: anyhow::Result<AutocompleteResponse>,
    ) {
        let _dispatch = self.dispatch_guard();
        if self.is_closed() || !self.sequencer.is_latest(kind.fetch_kind(), sequence) {
            debug!("autocomplete: discarding stale response kind={kind:?} sequence={sequence}");
            return;
        }

        let transition = match outcome {
            Ok(response) => kind.completed(response),
            Err(err) => {
                warn!("autocomplete: connector lookup failed kind={kind:?} err={err:#}");
                PartialSearchState {
                    error: Some(DriverError::Connector(format!("{err:#}")).to_string()),
                    ..PartialSearchState::default()
                }
            }
        };
        self.commit(transition);
    }
}

#[cfg(test)]
#[path = "tests/autocomplete_tests.rs"]
mod tests;
