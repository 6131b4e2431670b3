use std::sync::Arc;

use shared::{AutocompleteQueryConfig, PartialSearchState, QueryConfig};
use url_state::UrlManager;

use crate::SearchConnector;

/// Construction options for [`crate::SearchDriver`].
///
/// | field | default |
/// |---|---|
/// | `api_connector` | none (required) |
/// | `url_manager` | none; a no-op manager is used |
/// | `initial_state` | empty |
/// | `track_url_state` | `true` |
/// | `always_search_on_initial_load` | `false` |
/// | `autocomplete_minimum_characters` | `0` |
/// | `debounce_length` | `0` ms |
/// | `persistent_filters` | empty |
#[derive(Clone)]
pub struct DriverConfig {
    pub api_connector: Option<Arc<dyn SearchConnector>>,
    pub url_manager: Option<Arc<dyn UrlManager>>,
    pub initial_state: PartialSearchState,
    pub track_url_state: bool,
    pub always_search_on_initial_load: bool,
    /// Default gate for autocomplete lookups when an action does not give one.
    pub autocomplete_minimum_characters: usize,
    /// Debounce, in milliseconds, applied to the search triggered by filter,
    /// paging and sort actions.
    pub debounce_length: u64,
    /// Filter fields that survive a search-term change.
    pub persistent_filters: Vec<String>,
    pub query_config: QueryConfig,
    pub autocomplete_query: AutocompleteQueryConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            api_connector: None,
            url_manager: None,
            initial_state: PartialSearchState::default(),
            track_url_state: true,
            always_search_on_initial_load: false,
            autocomplete_minimum_characters: 0,
            debounce_length: 0,
            persistent_filters: Vec::new(),
            query_config: QueryConfig::default(),
            autocomplete_query: AutocompleteQueryConfig::default(),
        }
    }
}

impl DriverConfig {
    pub fn new(api_connector: Arc<dyn SearchConnector>) -> Self {
        Self {
            api_connector: Some(api_connector),
            ..Self::default()
        }
    }

    pub fn with_url_manager(mut self, url_manager: Arc<dyn UrlManager>) -> Self {
        self.url_manager = Some(url_manager);
        self
    }

    pub fn with_initial_state(mut self, initial_state: PartialSearchState) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn with_track_url_state(mut self, track_url_state: bool) -> Self {
        self.track_url_state = track_url_state;
        self
    }
}
