//! The public mutation surface.
//!
//! Every action commits the parameter change synchronously, so it is visible to
//! `get_state` and to listeners before the call returns. Actions that refresh
//! then schedule a search under the `"search"` debounce key and push the new
//! parameters to the URL manager.

use std::{sync::Arc, time::Duration};

use shared::{
    filters::{add_filter_value, remove_filter_value, retain_filters, set_filter_value},
    ClickEvent, Filter, FilterType, FilterValue, PartialSearchState, SortDirection,
};
use tracing::{debug, warn};

use crate::{autocomplete::AutocompleteKind, DriverCore};

/// Options for [`SearchActions::set_search_term`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTermOptions {
    /// Reset paging and filters, fetch results and push the URL. Default `true`.
    pub refresh: bool,
    /// Milliseconds of quiet before the fetch fires. `0` fetches immediately.
    pub debounce: u64,
    pub autocomplete_results: bool,
    pub autocomplete_suggestions: bool,
    /// Overrides the driver-wide minimum when set.
    pub autocomplete_minimum_characters: Option<usize>,
}

impl Default for SearchTermOptions {
    fn default() -> Self {
        Self {
            refresh: true,
            debounce: 0,
            autocomplete_results: false,
            autocomplete_suggestions: false,
            autocomplete_minimum_characters: None,
        }
    }
}

impl SearchTermOptions {
    /// Typing into a search box: no result refresh, only autocomplete.
    pub fn autocomplete_only(results: bool, suggestions: bool) -> Self {
        Self {
            refresh: false,
            autocomplete_results: results,
            autocomplete_suggestions: suggestions,
            ..Self::default()
        }
    }

    pub fn with_debounce(mut self, debounce: u64) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Cloneable handle to a driver's actions.
#[derive(Clone)]
pub struct SearchActions {
    core: Arc<DriverCore>,
}

impl SearchActions {
    pub(crate) fn new(core: Arc<DriverCore>) -> Self {
        Self { core }
    }

    pub fn set_search_term(&self, term: impl Into<String>, options: SearchTermOptions) {
        if self.is_closed("set_search_term") {
            return;
        }
        let core = &self.core;
        let _dispatch = core.dispatch_guard();
        let term = term.into();
        let debounce = Duration::from_millis(options.debounce);
        let minimum_characters = options
            .autocomplete_minimum_characters
            .unwrap_or(core.autocomplete_minimum_characters);

        let mut transition = PartialSearchState {
            search_term: Some(term.clone()),
            ..PartialSearchState::default()
        };
        for (requested, kind) in [
            (options.autocomplete_results, AutocompleteKind::Results),
            (options.autocomplete_suggestions, AutocompleteKind::Suggestions),
        ] {
            if !requested {
                core.discard_autocomplete(kind);
                transition = transition.overlay(kind.cleared());
            }
        }
        core.commit(transition);

        if options.refresh {
            let filters = retain_filters(&core.get_state().filters, &core.persistent_filters);
            core.commit(PartialSearchState {
                current: Some(1),
                filters: Some(filters),
                ..PartialSearchState::default()
            });
            core.schedule_search(debounce);
        }

        for (requested, kind) in [
            (options.autocomplete_results, AutocompleteKind::Results),
            (options.autocomplete_suggestions, AutocompleteKind::Suggestions),
        ] {
            if requested {
                core.request_autocomplete(kind, &term, debounce, minimum_characters);
            }
        }

        if options.refresh {
            core.push_url();
        }
    }

    pub fn add_filter(&self, field: &str, value: impl Into<FilterValue>, filter_type: FilterType) {
        let value = value.into();
        self.update_filters("add_filter", |filters| {
            add_filter_value(filters, field, value, filter_type)
        });
    }

    pub fn set_filter(&self, field: &str, value: impl Into<FilterValue>, filter_type: FilterType) {
        let value = value.into();
        self.update_filters("set_filter", |filters| {
            set_filter_value(filters, field, value, filter_type)
        });
    }

    /// Removes one value when `value` is given, otherwise the whole field.
    pub fn remove_filter(
        &self,
        field: &str,
        value: Option<FilterValue>,
        filter_type: Option<FilterType>,
    ) {
        self.update_filters("remove_filter", |filters| {
            remove_filter_value(filters, field, value.as_ref(), filter_type)
        });
    }

    pub fn clear_filters(&self, except: &[String]) {
        self.update_filters("clear_filters", |filters| retain_filters(filters, except));
    }

    pub fn set_current(&self, current: u64) {
        let current = at_least_one("current", current);
        self.update_search_parameters(
            "set_current",
            PartialSearchState {
                current: Some(current),
                ..PartialSearchState::default()
            },
        );
    }

    pub fn set_results_per_page(&self, results_per_page: u64) {
        let results_per_page = at_least_one("results_per_page", results_per_page);
        self.update_search_parameters(
            "set_results_per_page",
            PartialSearchState {
                results_per_page: Some(results_per_page),
                ..PartialSearchState::default()
            },
        );
    }

    pub fn set_sort(&self, field: impl Into<String>, direction: SortDirection) {
        self.update_search_parameters(
            "set_sort",
            PartialSearchState {
                sort_field: Some(field.into()),
                sort_direction: Some(direction),
                ..PartialSearchState::default()
            },
        );
    }

    /// Restores the state the driver was configured with (before URL state was
    /// applied) and invalidates every in-flight lookup.
    pub fn reset(&self) {
        if self.is_closed("reset") {
            return;
        }
        let core = &self.core;
        let _dispatch = core.dispatch_guard();
        core.scheduler.cancel_all();
        core.sequencer.invalidate_all();
        core.commit(PartialSearchState::from_state(core.starting_state.clone()));
        if core.starting_state.has_search_parameters() {
            core.schedule_search(Duration::ZERO);
        }
        core.push_url();
    }

    /// Reports a result click to the connector. Fire-and-forget: failures are
    /// logged only.
    pub fn track_click_through(&self, document_id: impl Into<String>, tags: Vec<String>) {
        if self.is_closed("track_click_through") {
            return;
        }
        let state = self.core.get_state();
        let event = ClickEvent {
            query: state.result_search_term.clone(),
            document_id: document_id.into(),
            request_id: state.request_id.clone(),
            tags,
        };
        let connector = Arc::clone(&self.core.connector);
        self.core.runtime.spawn(async move {
            if let Err(err) = connector.click(&event).await {
                warn!(
                    "search: click tracking failed document_id={} err={err:#}",
                    event.document_id
                );
            }
        });
    }

    fn update_filters<F>(&self, action: &str, update: F)
    where
        F: FnOnce(&[Filter]) -> Vec<Filter>,
    {
        if self.is_closed(action) {
            return;
        }
        let _dispatch = self.core.dispatch_guard();
        let filters = update(&self.core.get_state().filters);
        self.update_search_parameters(
            action,
            PartialSearchState {
                current: Some(1),
                filters: Some(filters),
                ..PartialSearchState::default()
            },
        );
    }

    fn update_search_parameters(&self, action: &str, transition: PartialSearchState) {
        if self.is_closed(action) {
            return;
        }
        let core = &self.core;
        let _dispatch = core.dispatch_guard();
        core.commit(transition);
        core.schedule_search(Duration::from_millis(core.debounce_length));
        core.push_url();
    }

    fn is_closed(&self, action: &str) -> bool {
        let closed = self.core.is_closed();
        if closed {
            debug!("search: ignoring {action} on a torn down driver");
        }
        closed
    }
}

fn at_least_one(name: &str, value: u64) -> u64 {
    if value == 0 {
        warn!("search: clamping {name}=0 to 1");
        return 1;
    }
    value
}

#[cfg(test)]
#[path = "tests/actions_tests.rs"]
mod tests;
