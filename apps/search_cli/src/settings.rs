use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

const ENV_PREFIX: &str = "SEARCH__";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// JSON array of documents served by the in-memory connector.
    pub documents: PathBuf,
    pub log_filter: String,
    /// Location the in-memory URL manager starts from.
    pub start_url: String,
    pub results_per_page: u64,
    pub debounce_length: u64,
    pub autocomplete_minimum_characters: usize,
    pub search_fields: Vec<String>,
    pub facets: Vec<String>,
    pub persistent_filters: Vec<String>,
    /// Upper bound, in milliseconds, on waiting for a lookup to resolve.
    pub wait_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            documents: "documents.json".into(),
            log_filter: "info".into(),
            start_url: "search://local/".into(),
            results_per_page: shared::domain::DEFAULT_RESULTS_PER_PAGE,
            debounce_length: 0,
            autocomplete_minimum_characters: 2,
            search_fields: Vec::new(),
            facets: Vec::new(),
            persistent_filters: Vec::new(),
            wait_timeout_ms: 5_000,
        }
    }
}

/// Defaults, then `path` if it exists, then `SEARCH__*` environment variables.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<Settings>(&raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

pub fn apply_env_overrides<F>(mut settings: Settings, lookup: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

    if let Some(v) = var("DOCUMENTS") {
        settings.documents = v.into();
    }
    if let Some(v) = var("LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = var("START_URL") {
        settings.start_url = v;
    }
    if let Some(v) = var("RESULTS_PER_PAGE") {
        settings.results_per_page = parse_number("RESULTS_PER_PAGE", &v)?;
    }
    if let Some(v) = var("DEBOUNCE_LENGTH") {
        settings.debounce_length = parse_number("DEBOUNCE_LENGTH", &v)?;
    }
    if let Some(v) = var("AUTOCOMPLETE_MINIMUM_CHARACTERS") {
        settings.autocomplete_minimum_characters =
            parse_number("AUTOCOMPLETE_MINIMUM_CHARACTERS", &v)?;
    }
    if let Some(v) = var("SEARCH_FIELDS") {
        settings.search_fields = split_list(&v);
    }
    if let Some(v) = var("FACETS") {
        settings.facets = split_list(&v);
    }
    if let Some(v) = var("PERSISTENT_FILTERS") {
        settings.persistent_filters = split_list(&v);
    }
    if let Some(v) = var("WAIT_TIMEOUT_MS") {
        settings.wait_timeout_ms = parse_number("WAIT_TIMEOUT_MS", &v)?;
    }

    Ok(settings)
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{ENV_PREFIX}{name} must be a number, got '{raw}'"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
