//! Query-string encoding of the search parameters.
//!
//! Scalars map to one pair each (`q`, `current`, `size`, `sort-field`,
//! `sort-direction`); every filter is one `filters` pair holding the filter as
//! JSON, repeated in filter order. Result fields never reach the URL.

use shared::{Filter, PartialSearchState, SearchState, SortDirection};
use tracing::warn;
use url::form_urlencoded;

const TERM: &str = "q";
const CURRENT: &str = "current";
const SIZE: &str = "size";
const SORT_FIELD: &str = "sort-field";
const SORT_DIRECTION: &str = "sort-direction";
const FILTERS: &str = "filters";

pub fn state_to_query(state: &SearchState) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if !state.search_term.is_empty() {
        query.append_pair(TERM, &state.search_term);
    }
    query.append_pair(SIZE, &state.results_per_page.to_string());
    query.append_pair(CURRENT, &state.current.to_string());
    if !state.sort_field.is_empty() {
        query.append_pair(SORT_FIELD, &state.sort_field);
        if state.sort_direction != SortDirection::Unset {
            query.append_pair(SORT_DIRECTION, state.sort_direction.as_str());
        }
    }
    for filter in &state.filters {
        match serde_json::to_string(filter) {
            Ok(encoded) => {
                query.append_pair(FILTERS, &encoded);
            }
            Err(err) => warn!(
                "url_state: dropping unencodable filter field={} err={err}",
                filter.field
            ),
        }
    }
    query.finish()
}

/// Malformed pairs are skipped with a warning; a bad URL never blocks startup.
pub fn query_to_state(query: &str) -> PartialSearchState {
    let mut partial = PartialSearchState::default();
    let mut filters = Vec::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match &*key {
            TERM => partial.search_term = Some(value.into_owned()),
            CURRENT => partial.current = parse_positive(CURRENT, &value),
            SIZE => partial.results_per_page = parse_positive(SIZE, &value),
            SORT_FIELD => partial.sort_field = Some(value.into_owned()),
            SORT_DIRECTION => match value.parse::<SortDirection>() {
                Ok(direction) => partial.sort_direction = Some(direction),
                Err(err) => warn!("url_state: ignoring {SORT_DIRECTION}: {err}"),
            },
            FILTERS => match parse_filter(&value) {
                Some(filter) => filters.push(filter),
                None => warn!("url_state: ignoring malformed filter value={value}"),
            },
            _ => {}
        }
    }

    if !filters.is_empty() {
        partial.filters = Some(filters);
    }
    partial
}

fn parse_positive(key: &str, raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => {
            warn!("url_state: ignoring {key}={raw}, expected a positive integer");
            None
        }
        Ok(value) => Some(value),
    }
}

fn parse_filter(raw: &str) -> Option<Filter> {
    let filter: Filter = serde_json::from_str(raw).ok()?;
    (!filter.field.is_empty()).then_some(filter)
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
