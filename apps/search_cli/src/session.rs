use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use search_driver::{DriverConfig, SearchDriver, SearchTermOptions, Subscription};
use shared::{PartialSearchState, QueryConfig, SearchState};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use url_state::MemoryUrlManager;

use crate::{
    commands::{parse_command, Command, HELP},
    memory_connector::MemoryConnector,
    settings::Settings,
};

/// A driver wired to the in-memory connector and an in-memory location.
pub struct Session {
    driver: SearchDriver,
    _commits: Subscription,
    location: Arc<MemoryUrlManager>,
    wait_timeout: Duration,
    autocomplete_minimum_characters: usize,
}

impl Session {
    pub fn start(
        settings: &Settings,
        connector: MemoryConnector,
        initial_state: PartialSearchState,
        always_search: bool,
    ) -> Result<Self> {
        let location = Arc::new(
            MemoryUrlManager::new(&settings.start_url)
                .with_context(|| format!("invalid start url '{}'", settings.start_url))?,
        );

        let mut config = DriverConfig::new(Arc::new(connector))
            .with_url_manager(location.clone())
            .with_initial_state(PartialSearchState {
                results_per_page: Some(settings.results_per_page),
                ..PartialSearchState::default()
            }
            .overlay(initial_state));
        config.always_search_on_initial_load = always_search;
        config.debounce_length = settings.debounce_length;
        config.autocomplete_minimum_characters = settings.autocomplete_minimum_characters;
        config.persistent_filters = settings.persistent_filters.clone();
        config.query_config = query_config(settings);

        let driver = SearchDriver::new(config)?;
        let commits = driver.subscribe(|state: &SearchState| {
            debug!(
                "search_cli: state committed term={:?} loading={} results={}",
                state.search_term,
                state.is_loading,
                state.results.len()
            );
        });

        Ok(Self {
            driver,
            _commits: commits,
            location,
            wait_timeout: Duration::from_millis(settings.wait_timeout_ms),
            autocomplete_minimum_characters: settings.autocomplete_minimum_characters,
        })
    }

    /// Waits for the startup search, then prints the page.
    pub async fn print_first_page(&self) -> Result<()> {
        let state = self
            .wait_for("the initial search", |state| {
                state.was_searched && !state.is_loading
            })
            .await?;
        self.print_page(&state)
    }

    pub async fn repl(&self) -> Result<()> {
        println!("{HELP}");
        let mut lines = BufReader::new(io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    println!("error: {err:#}");
                    continue;
                }
            };
            match self.run(command).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => println!("error: {err:#}"),
            }
        }
        info!("search_cli: repl finished");
        Ok(())
    }

    /// Returns `false` once the session should end.
    pub async fn run(&self, command: Command) -> Result<bool> {
        let actions = self.driver.actions();
        let before = self.driver.get_state();

        match command {
            Command::Search(term) => {
                actions.set_search_term(term, SearchTermOptions::default());
            }
            Command::Suggest(term) => {
                if term.chars().count() < self.autocomplete_minimum_characters {
                    println!(
                        "suggest: needs at least {} characters",
                        self.autocomplete_minimum_characters
                    );
                    return Ok(true);
                }
                actions.set_search_term(term, SearchTermOptions::autocomplete_only(true, true));
                let state = self
                    .wait_for("autocomplete", |state| {
                        let resolved = state.autocompleted_results_request_id
                            != before.autocompleted_results_request_id
                            && state.autocompleted_suggestions_request_id
                                != before.autocompleted_suggestions_request_id;
                        resolved || (!state.error.is_empty() && state.error != before.error)
                    })
                    .await?;
                print_autocomplete(&state)?;
                return Ok(true);
            }
            Command::AddFilter {
                field,
                value,
                filter_type,
            } => actions.add_filter(&field, value, filter_type),
            Command::SetFilter {
                field,
                value,
                filter_type,
            } => actions.set_filter(&field, value, filter_type),
            Command::RemoveFilter { field, value } => actions.remove_filter(&field, value, None),
            Command::ClearFilters => actions.clear_filters(&[]),
            Command::Page(current) => actions.set_current(current),
            Command::Size(results_per_page) => actions.set_results_per_page(results_per_page),
            Command::Sort { field, direction } => actions.set_sort(field, direction),
            Command::Click(document_id) => {
                actions.track_click_through(document_id.as_str(), vec!["search_cli".to_string()]);
                println!("click recorded document_id={document_id}");
                return Ok(true);
            }
            Command::Reset => {
                actions.reset();
                let state = self
                    .wait_for("reset", |state| !state.is_loading)
                    .await?;
                self.print_page(&state)?;
                return Ok(true);
            }
            Command::Back => {
                if !self.location.back() {
                    println!("already at the oldest location");
                    return Ok(true);
                }
            }
            Command::Forward => {
                if !self.location.forward() {
                    println!("already at the newest location");
                    return Ok(true);
                }
            }
            Command::State => {
                println!("{}", serde_json::to_string_pretty(&*before)?);
                return Ok(true);
            }
            Command::Help => {
                println!("{HELP}");
                return Ok(true);
            }
            Command::Quit => return Ok(false),
        }

        let state = self
            .wait_for("search results", |state| {
                !state.is_loading
                    && (state.request_id != before.request_id
                        || (!state.error.is_empty() && state.error != before.error))
            })
            .await?;
        self.print_page(&state)?;
        Ok(true)
    }

    pub fn tear_down(&self) {
        self.driver.tear_down();
    }

    async fn wait_for<F>(&self, what: &str, done: F) -> Result<Arc<SearchState>>
    where
        F: Fn(&SearchState) -> bool,
    {
        let mut states = self.driver.watch_state();
        let wait = async {
            loop {
                let state = Arc::clone(&states.borrow_and_update());
                if done(&state) {
                    return anyhow::Ok(state);
                }
                states.changed().await.context("driver stopped")?;
            }
        };
        tokio::time::timeout(self.wait_timeout, wait)
            .await
            .with_context(|| format!("timed out waiting for {what}"))?
    }

    fn print_page(&self, state: &SearchState) -> Result<()> {
        println!(
            "term={:?} page={}/{} total_results={} request_id={}",
            state.result_search_term,
            state.current,
            state.total_pages,
            state.total_results,
            state.request_id
        );
        if !state.sort_field.is_empty() {
            println!("sort={} {}", state.sort_field, state.sort_direction.as_str());
        }
        for filter in &state.filters {
            println!(
                "filter {} {} {}",
                filter.filter_type,
                filter.field,
                serde_json::to_string(&filter.values)?
            );
        }
        for result in &state.results {
            println!("  {}", serde_json::to_string(result)?);
        }
        if !state.facets.is_empty() {
            println!("facets={}", serde_json::to_string(&state.facets)?);
        }
        if !state.error.is_empty() {
            println!("error={}", state.error);
        }
        println!("url={}", self.location.current_url());
        Ok(())
    }
}

fn query_config(settings: &Settings) -> QueryConfig {
    let mut query_config = QueryConfig::default();
    for field in &settings.search_fields {
        query_config
            .search_fields
            .insert(field.clone(), serde_json::json!({}));
    }
    for field in &settings.facets {
        query_config
            .facets
            .insert(field.clone(), serde_json::json!({ "type": "value" }));
    }
    query_config
}

fn print_autocomplete(state: &SearchState) -> Result<()> {
    for result in &state.autocompleted_results {
        println!("  result {}", serde_json::to_string(result)?);
    }
    for (group, suggestions) in &state.autocompleted_suggestions {
        for suggestion in suggestions {
            println!("  {group}: {}", suggestion.suggestion);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
