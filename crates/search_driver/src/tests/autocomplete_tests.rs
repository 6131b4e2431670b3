use serde_json::json;
use shared::AutocompleteQueryConfig;

use super::*;
use crate::{test_support::*, SearchTermOptions};

fn results_only() -> SearchTermOptions {
    SearchTermOptions::autocomplete_only(true, false)
}

fn suggestions_only() -> SearchTermOptions {
    SearchTermOptions::autocomplete_only(false, true)
}

fn with_minimum(mut options: SearchTermOptions, minimum: usize) -> SearchTermOptions {
    options.autocomplete_minimum_characters = Some(minimum);
    options
}

#[tokio::test(start_paused = true)]
async fn result_lookup_populates_autocompleted_results() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver.actions().set_search_term("park", results_only());
    settle().await;

    let state = driver.get_state();
    let ids: Vec<Option<&str>> = state
        .autocompleted_results
        .iter()
        .map(|result| result.id.as_deref())
        .collect();
    assert_eq!(ids, vec![Some("park-ac-1"), Some("park-ac-2")]);
    assert_eq!(state.autocompleted_results_request_id, "autocomplete-1");
    assert!(state.autocompleted_suggestions.is_empty());
    assert_eq!(connector.search_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn suggestion_lookup_populates_autocompleted_suggestions() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver.actions().set_search_term("car", suggestions_only());
    settle().await;

    let state = driver.get_state();
    assert_eq!(state.autocompleted_suggestions, sample_suggestions());
    assert!(state.autocompleted_results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn each_kind_sends_only_its_own_section() {
    let connector = RecordingConnector::new();
    let driver = driver_with(&connector, |mut config| {
        config.autocomplete_query = AutocompleteQueryConfig {
            results: Some(json!({"resultsPerPage": 5})),
            suggestions: Some(json!({"types": {"documents": {"fields": ["title"]}}})),
        };
        config
    });

    driver
        .actions()
        .set_search_term("term", SearchTermOptions::autocomplete_only(true, true));
    settle().await;

    let calls = connector.autocomplete_calls();
    assert_eq!(calls.len(), 2);
    let (_, results_call) = calls
        .iter()
        .find(|(_, config)| config.results.is_some())
        .expect("results lookup");
    assert_eq!(results_call.results, Some(json!({"resultsPerPage": 5})));
    assert_eq!(results_call.suggestions, None);
    let (_, suggestions_call) = calls
        .iter()
        .find(|(_, config)| config.suggestions.is_some())
        .expect("suggestions lookup");
    assert_eq!(suggestions_call.results, None);
}

#[tokio::test(start_paused = true)]
async fn undebounced_lookups_each_fire() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    for _ in 0..3 {
        driver.actions().set_search_term("term", results_only());
    }
    settle().await;

    assert_eq!(connector.autocomplete_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn debounced_lookups_collapse() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    for term in ["t", "te", "ter"] {
        driver
            .actions()
            .set_search_term(term, results_only().with_debounce(10));
    }
    settle().await;

    let calls = connector.autocomplete_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "ter");
}

#[tokio::test(start_paused = true)]
async fn results_and_suggestions_do_not_cancel_each_other_or_the_search() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver.actions().set_search_term(
        "term",
        SearchTermOptions {
            autocomplete_results: true,
            autocomplete_suggestions: true,
            ..SearchTermOptions::default()
        }
        .with_debounce(10),
    );
    settle().await;

    assert_eq!(connector.search_count(), 1);
    assert_eq!(connector.autocomplete_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn short_terms_are_not_looked_up() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver
        .actions()
        .set_search_term("term", with_minimum(results_only(), 5));
    settle().await;
    assert_eq!(connector.autocomplete_count(), 0);

    driver
        .actions()
        .set_search_term("term", with_minimum(results_only(), 2));
    settle().await;
    assert_eq!(connector.autocomplete_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn configured_minimum_applies_when_the_action_gives_none() {
    let connector = RecordingConnector::new();
    let driver = driver_with(&connector, |mut config| {
        config.autocomplete_minimum_characters = 5;
        config
    });

    driver.actions().set_search_term("term", results_only());
    settle().await;

    assert_eq!(connector.autocomplete_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn minimum_counts_characters_not_bytes() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver
        .actions()
        .set_search_term("épée", with_minimum(results_only(), 5));
    settle().await;

    assert_eq!(connector.autocomplete_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn skipped_lookup_keeps_previous_autocomplete_state() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver.actions().set_search_term("term", results_only());
    settle().await;
    driver
        .actions()
        .set_search_term("te", with_minimum(results_only(), 3));
    settle().await;

    let state = driver.get_state();
    assert_eq!(state.search_term, "te");
    assert_eq!(state.autocompleted_results[0].id.as_deref(), Some("term-ac-1"));
}

#[tokio::test(start_paused = true)]
async fn short_term_cancels_a_pending_lookup_for_a_longer_one() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver
        .actions()
        .set_search_term("term", with_minimum(results_only(), 3).with_debounce(20));
    driver
        .actions()
        .set_search_term("te", with_minimum(results_only(), 3).with_debounce(20));
    settle().await;

    assert_eq!(connector.autocomplete_count(), 0);
    assert!(driver.get_state().autocompleted_results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn late_lookup_for_an_older_term_is_discarded() {
    let connector = RecordingConnector::new();
    connector.delay_autocomplete("ab", Duration::from_millis(50));
    let driver = driver(&connector);

    driver.actions().set_search_term("ab", results_only());
    driver.actions().set_search_term("abc", results_only());
    settle().await;

    let state = driver.get_state();
    let ids: Vec<Option<&str>> = state
        .autocompleted_results
        .iter()
        .map(|result| result.id.as_deref())
        .collect();
    assert_eq!(connector.autocomplete_count(), 2);
    assert_eq!(ids, vec![Some("abc-ac-1"), Some("abc-ac-2")]);
    assert_eq!(state.autocompleted_results_request_id, "autocomplete-2");
}

#[tokio::test(start_paused = true)]
async fn turning_a_kind_off_clears_it_immediately() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver
        .actions()
        .set_search_term("term", SearchTermOptions::autocomplete_only(true, true));
    settle().await;
    assert!(!driver.get_state().autocompleted_results.is_empty());

    driver
        .actions()
        .set_search_term("term", SearchTermOptions::autocomplete_only(false, false));

    let state = driver.get_state();
    assert!(state.autocompleted_results.is_empty());
    assert!(state.autocompleted_suggestions.is_empty());
    assert_eq!(state.autocompleted_results_request_id, "");
}

#[tokio::test(start_paused = true)]
async fn turning_a_kind_off_discards_its_in_flight_lookup() {
    let connector = RecordingConnector::new();
    connector.delay_autocomplete("slow", Duration::from_millis(50));
    let driver = driver(&connector);

    driver.actions().set_search_term("slow", results_only());
    driver
        .actions()
        .set_search_term("slow", SearchTermOptions::autocomplete_only(false, false));
    settle().await;

    assert_eq!(connector.autocomplete_count(), 1);
    assert!(driver.get_state().autocompleted_results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn turning_a_kind_off_cancels_its_pending_lookup() {
    let connector = RecordingConnector::new();
    let driver = driver(&connector);

    driver
        .actions()
        .set_search_term("term", results_only().with_debounce(20));
    driver
        .actions()
        .set_search_term("term", SearchTermOptions::autocomplete_only(false, false));
    settle().await;

    assert_eq!(connector.autocomplete_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_lookup_records_the_error() {
    let connector = RecordingConnector::new();
    connector.fail_term("oops");
    let driver = driver(&connector);

    driver.actions().set_search_term("oops", results_only());
    settle().await;

    let state = driver.get_state();
    assert!(state.error.contains("autocomplete unavailable"));
    assert!(state.autocompleted_results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn successful_lookup_clears_an_earlier_failure() {
    let connector = RecordingConnector::new();
    connector.fail_term("oops");
    let driver = driver(&connector);

    driver.actions().set_search_term("oops", results_only());
    settle().await;
    assert!(!driver.get_state().error.is_empty());

    driver
        .actions()
        .set_search_term("okay", SearchTermOptions::autocomplete_only(false, true));
    settle().await;

    let state = driver.get_state();
    assert_eq!(state.error, "");
    assert!(!state.autocompleted_suggestions.is_empty());
}
