//! Client-side search state driver.
//!
//! A [`SearchDriver`] owns the canonical [`SearchState`], exposes the mutation
//! actions through [`SearchActions`], runs debounced lookups against an injected
//! [`SearchConnector`] and keeps subscribers and an optional [`UrlManager`] in
//! sync with every committed snapshot.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use shared::{
    AutocompleteQueryConfig, AutocompleteResponse, ClickEvent, PartialSearchState, QueryConfig,
    ResultBatch, SearchState,
};
use thiserror::Error;
use tokio::{
    runtime::Handle,
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use url_state::{NoopUrlManager, UrlManager};

pub mod actions;
mod autocomplete;
pub mod config;
pub mod debounce;
mod fetch;
pub mod sequence;
pub mod store;
pub mod subscriptions;

pub use actions::{SearchActions, SearchTermOptions};
pub use autocomplete::AutocompleteKind;
pub use config::DriverConfig;
pub use subscriptions::Subscription;

use debounce::DebounceScheduler;
use sequence::RequestSequencer;
use store::StateStore;
use subscriptions::SubscriptionRegistry;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("connector error: {0}")]
    Connector(String),
}

/// The search backend. Empty answers are empty batches, not errors.
#[async_trait]
pub trait SearchConnector: Send + Sync {
    async fn search(&self, state: &SearchState, query_config: &QueryConfig) -> Result<ResultBatch>;
    async fn autocomplete(
        &self,
        term: &str,
        query_config: &AutocompleteQueryConfig,
    ) -> Result<AutocompleteResponse>;
    async fn click(&self, event: &ClickEvent) -> Result<()>;
}

pub(crate) struct DriverCore {
    connector: Arc<dyn SearchConnector>,
    url_manager: Arc<dyn UrlManager>,
    track_url_state: bool,
    query_config: QueryConfig,
    autocomplete_query: AutocompleteQueryConfig,
    autocomplete_minimum_characters: usize,
    debounce_length: u64,
    persistent_filters: Vec<String>,
    starting_state: SearchState,
    store: StateStore,
    subscriptions: SubscriptionRegistry,
    scheduler: DebounceScheduler,
    sequencer: RequestSequencer,
    dispatch: ReentrantMutex<()>,
    runtime: Handle,
    closed: AtomicBool,
    url_watch: Mutex<Option<JoinHandle<()>>>,
}

impl DriverCore {
    /// Serializes a synchronous section against every other commit. Re-entrant,
    /// so listeners may call actions while being notified.
    pub(crate) fn dispatch_guard(&self) -> ReentrantMutexGuard<'_, ()> {
        self.dispatch.lock()
    }

    pub(crate) fn commit(&self, transition: PartialSearchState) -> Arc<SearchState> {
        let _dispatch = self.dispatch_guard();
        let state = self.store.commit(transition);
        self.subscriptions.notify(&state);
        state
    }

    pub(crate) fn get_state(&self) -> Arc<SearchState> {
        self.store.get_state()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn push_url(&self) {
        if !self.track_url_state || self.is_closed() {
            return;
        }
        if let Err(err) = self.url_manager.push_state_to_url(&self.get_state()) {
            warn!("search: url push failed err={err:#}");
        }
    }

    /// Applies a location change the driver did not cause. Parameters missing
    /// from the location fall back to the starting state; the URL is not pushed
    /// back.
    fn apply_url_change(self: &Arc<Self>, change: PartialSearchState) {
        if self.is_closed() {
            return;
        }
        let _dispatch = self.dispatch_guard();
        let parameters = self
            .starting_state
            .search_parameters()
            .overlay(change.search_parameters_only());
        debug!("search: applying url state change");
        self.commit(parameters);
        self.schedule_search(std::time::Duration::ZERO);
    }

    fn spawn_url_watch(self: &Arc<Self>, mut changes: broadcast::Receiver<PartialSearchState>) {
        let core = Arc::downgrade(self);
        let task = self.runtime.spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        let Some(core) = core.upgrade() else {
                            break;
                        };
                        core.apply_url_change(change);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("search: url change listener lagged skipped={skipped}");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        *self.url_watch.lock() = Some(task);
    }

    fn tear_down(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.scheduler.close();
        self.subscriptions.clear();
        if let Some(task) = self.url_watch.lock().take() {
            task.abort();
        }
        info!("search: driver torn down");
    }
}

/// Owner of a driver instance. Dropping it tears the driver down.
pub struct SearchDriver {
    core: Arc<DriverCore>,
    actions: SearchActions,
}

impl SearchDriver {
    /// Must be called from within a tokio runtime; debounce timers and connector
    /// calls are spawned onto it.
    pub fn new(config: DriverConfig) -> std::result::Result<Self, DriverError> {
        let connector = config.api_connector.ok_or_else(|| {
            DriverError::Configuration("an api connector is required".to_string())
        })?;
        let runtime = Handle::try_current().map_err(|err| {
            DriverError::Configuration(format!("a tokio runtime is required: {err}"))
        })?;
        if config.initial_state.current == Some(0) {
            return Err(DriverError::Configuration(
                "initial current page must be at least 1".to_string(),
            ));
        }
        if config.initial_state.results_per_page == Some(0) {
            return Err(DriverError::Configuration(
                "initial results per page must be at least 1".to_string(),
            ));
        }

        let url_manager: Arc<dyn UrlManager> = config
            .url_manager
            .unwrap_or_else(|| Arc::new(NoopUrlManager));

        let mut starting_state = SearchState::default();
        config.initial_state.apply_to(&mut starting_state);

        let mut seeded = starting_state.clone();
        if config.track_url_state {
            match url_manager.read_initial_state() {
                Ok(from_url) => from_url.search_parameters_only().apply_to(&mut seeded),
                Err(err) => warn!("search: ignoring unreadable url state err={err:#}"),
            }
        }

        let core = Arc::new(DriverCore {
            connector,
            url_manager: Arc::clone(&url_manager),
            track_url_state: config.track_url_state,
            query_config: config.query_config,
            autocomplete_query: config.autocomplete_query,
            autocomplete_minimum_characters: config.autocomplete_minimum_characters,
            debounce_length: config.debounce_length,
            persistent_filters: config.persistent_filters,
            starting_state,
            store: StateStore::new(seeded),
            subscriptions: SubscriptionRegistry::new(),
            scheduler: DebounceScheduler::new(runtime.clone()),
            sequencer: RequestSequencer::new(),
            dispatch: ReentrantMutex::new(()),
            runtime,
            closed: AtomicBool::new(false),
            url_watch: Mutex::new(None),
        });

        if config.track_url_state {
            if let Some(changes) = url_manager.subscribe_url_changes() {
                core.spawn_url_watch(changes);
            }
        }

        let state = core.get_state();
        info!(
            "search: driver ready track_url_state={} term={:?} filters={}",
            core.track_url_state,
            state.search_term,
            state.filters.len()
        );
        if state.has_search_parameters() || config.always_search_on_initial_load {
            core.start_search();
        }

        Ok(Self {
            actions: SearchActions::new(Arc::clone(&core)),
            core,
        })
    }

    pub fn get_state(&self) -> Arc<SearchState> {
        self.core.get_state()
    }

    pub fn get_actions(&self) -> SearchActions {
        self.actions.clone()
    }

    pub fn actions(&self) -> &SearchActions {
        &self.actions
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SearchState) + Send + Sync + 'static,
    {
        self.core.subscriptions.subscribe(listener)
    }

    /// Async view of the same snapshots the listeners see.
    pub fn watch_state(&self) -> watch::Receiver<Arc<SearchState>> {
        self.core.store.watch()
    }

    /// Cancels pending debounced work, drops every listener and stops following
    /// URL changes. In-flight connector calls run to completion but their
    /// responses are discarded.
    pub fn tear_down(&self) {
        self.core.tear_down();
    }
}

impl Drop for SearchDriver {
    fn drop(&mut self) {
        self.core.tear_down();
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
