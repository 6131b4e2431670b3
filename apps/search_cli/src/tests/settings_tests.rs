use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn temp_path(name: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("search_cli_{name}_{suffix}.toml"))
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let settings = load_settings(&temp_path("missing")).expect("settings");
    let defaults = Settings::default();

    assert_eq!(settings.start_url, defaults.start_url);
    assert_eq!(settings.results_per_page, 20);
    assert_eq!(settings.autocomplete_minimum_characters, 2);
}

#[test]
fn file_values_override_defaults() {
    let path = temp_path("file");
    fs::write(
        &path,
        r#"
documents = "parks.json"
results_per_page = 5
facets = ["states", "world_heritage_site"]
"#,
    )
    .expect("write settings");

    let settings = load_settings(&path).expect("settings");
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.documents, PathBuf::from("parks.json"));
    assert_eq!(settings.results_per_page, 5);
    assert_eq!(settings.facets, vec!["states", "world_heritage_site"]);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn malformed_file_is_an_error() {
    let path = temp_path("malformed");
    fs::write(&path, "results_per_page = \"many\"").expect("write settings");

    let result = load_settings(&path);
    fs::remove_file(&path).expect("cleanup");

    assert!(result.is_err());
}

#[test]
fn environment_overrides_win() {
    let settings = apply_env_overrides(
        Settings::default(),
        lookup(&[
            ("SEARCH__RESULTS_PER_PAGE", "50"),
            ("SEARCH__SEARCH_FIELDS", "title, description,,"),
            ("SEARCH__LOG_FILTER", "debug"),
            ("UNRELATED", "ignored"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.results_per_page, 50);
    assert_eq!(settings.search_fields, vec!["title", "description"]);
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn non_numeric_environment_values_are_rejected() {
    let err = apply_env_overrides(
        Settings::default(),
        lookup(&[("SEARCH__DEBOUNCE_LENGTH", "soon")]),
    )
    .expect_err("rejected");

    assert!(err.to_string().contains("SEARCH__DEBOUNCE_LENGTH"));
}
