use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{
    AutocompleteQueryConfig, AutocompleteResponse, ClickEvent, PartialSearchState, QueryConfig,
    ResultBatch, SearchResult, SearchState, Suggestion,
};
use tokio::sync::broadcast;
use url_state::UrlManager;

use crate::{DriverConfig, SearchConnector, SearchDriver};

pub(crate) const TOTAL_RESULTS: u64 = 41;

#[derive(Default)]
pub(crate) struct RecordingConnector {
    searches: Mutex<Vec<SearchState>>,
    autocompletes: Mutex<Vec<(String, AutocompleteQueryConfig)>>,
    clicks: Mutex<Vec<ClickEvent>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    autocomplete_delays: Mutex<HashMap<String, Duration>>,
    failing_terms: Mutex<Vec<String>>,
}

impl RecordingConnector {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn delay_search(&self, term: &str, delay: Duration) {
        self.search_delays.lock().insert(term.to_string(), delay);
    }

    pub(crate) fn delay_autocomplete(&self, term: &str, delay: Duration) {
        self.autocomplete_delays
            .lock()
            .insert(term.to_string(), delay);
    }

    pub(crate) fn fail_term(&self, term: &str) {
        self.failing_terms.lock().push(term.to_string());
    }

    pub(crate) fn recover(&self) {
        self.failing_terms.lock().clear();
    }

    pub(crate) fn search_calls(&self) -> Vec<SearchState> {
        self.searches.lock().clone()
    }

    pub(crate) fn search_count(&self) -> usize {
        self.searches.lock().len()
    }

    pub(crate) fn autocomplete_calls(&self) -> Vec<(String, AutocompleteQueryConfig)> {
        self.autocompletes.lock().clone()
    }

    pub(crate) fn autocomplete_count(&self) -> usize {
        self.autocompletes.lock().len()
    }

    pub(crate) fn clicks(&self) -> Vec<ClickEvent> {
        self.clicks.lock().clone()
    }

    fn is_failing(&self, term: &str) -> bool {
        self.failing_terms.lock().iter().any(|failing| failing == term)
    }
}

pub(crate) fn sample_suggestions() -> BTreeMap<String, Vec<Suggestion>> {
    BTreeMap::from([(
        "documents".to_string(),
        vec![
            Suggestion::new("carlsbad"),
            Suggestion::new("carlsbad caverns"),
            Suggestion::new("carolina"),
        ],
    )])
}

#[async_trait]
impl SearchConnector for RecordingConnector {
    async fn search(
        &self,
        state: &SearchState,
        _query_config: &QueryConfig,
    ) -> Result<ResultBatch> {
        let call = {
            let mut searches = self.searches.lock();
            searches.push(state.clone());
            searches.len()
        };
        let delay = self.search_delays.lock().get(&state.search_term).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.is_failing(&state.search_term) {
            return Err(anyhow!("backend unavailable"));
        }
        Ok(ResultBatch {
            results: vec![
                SearchResult::with_id(format!("{}-1", state.search_term)),
                SearchResult::with_id(format!("{}-2", state.search_term)),
            ],
            total_results: TOTAL_RESULTS,
            facets: BTreeMap::new(),
            request_id: Some(format!("search-{call}")),
        })
    }

    async fn autocomplete(
        &self,
        term: &str,
        query_config: &AutocompleteQueryConfig,
    ) -> Result<AutocompleteResponse> {
        let call = {
            let mut autocompletes = self.autocompletes.lock();
            autocompletes.push((term.to_string(), query_config.clone()));
            autocompletes.len()
        };
        let delay = self.autocomplete_delays.lock().get(term).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.is_failing(term) {
            return Err(anyhow!("autocomplete unavailable"));
        }
        Ok(AutocompleteResponse {
            results: query_config.results.as_ref().map(|_| {
                vec![
                    SearchResult::with_id(format!("{term}-ac-1")),
                    SearchResult::with_id(format!("{term}-ac-2")),
                ]
            }),
            suggestions: query_config.suggestions.as_ref().map(|_| sample_suggestions()),
            request_id: Some(format!("autocomplete-{call}")),
        })
    }

    async fn click(&self, event: &ClickEvent) -> Result<()> {
        self.clicks.lock().push(event.clone());
        Ok(())
    }
}

pub(crate) struct RecordingUrlManager {
    initial: PartialSearchState,
    pushes: Mutex<Vec<SearchState>>,
    changes: broadcast::Sender<PartialSearchState>,
}

impl RecordingUrlManager {
    pub(crate) fn new(initial: PartialSearchState) -> Arc<Self> {
        let (changes, _) = broadcast::channel(16);
        Arc::new(Self {
            initial,
            pushes: Mutex::new(Vec::new()),
            changes,
        })
    }

    pub(crate) fn pushes(&self) -> Vec<SearchState> {
        self.pushes.lock().clone()
    }

    pub(crate) fn push_count(&self) -> usize {
        self.pushes.lock().len()
    }

    pub(crate) fn announce(&self, change: PartialSearchState) {
        let _ = self.changes.send(change);
    }
}

impl UrlManager for RecordingUrlManager {
    fn read_initial_state(&self) -> Result<PartialSearchState> {
        Ok(self.initial.clone())
    }

    fn push_state_to_url(&self, state: &SearchState) -> Result<()> {
        self.pushes.lock().push(state.clone());
        Ok(())
    }

    fn subscribe_url_changes(&self) -> Option<broadcast::Receiver<PartialSearchState>> {
        Some(self.changes.subscribe())
    }
}

pub(crate) fn driver_with(
    connector: &Arc<RecordingConnector>,
    configure: impl FnOnce(DriverConfig) -> DriverConfig,
) -> SearchDriver {
    let config = configure(DriverConfig::new(connector.clone()));
    SearchDriver::new(config).expect("driver")
}

pub(crate) fn driver(connector: &Arc<RecordingConnector>) -> SearchDriver {
    driver_with(connector, |config| config)
}

pub(crate) fn initial(state: PartialSearchState) -> impl FnOnce(DriverConfig) -> DriverConfig {
    move |config| config.with_initial_state(state)
}

/// Lets every spawned task and every timer under 200ms run to completion. Tests
/// run with the clock paused, so this is instant and deterministic.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}
