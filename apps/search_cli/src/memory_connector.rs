//! A [`SearchConnector`] over a JSON array of documents held in memory.

use std::{
    cmp::Ordering as CmpOrdering,
    collections::BTreeMap,
    fs,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use search_driver::SearchConnector;
use serde_json::{json, Value};
use shared::{
    filters::filter_values_match, AutocompleteQueryConfig, AutocompleteResponse, ClickEvent,
    Filter, FilterType, QueryConfig, ResultBatch, SearchResult, SearchState, SortDirection,
    Suggestion,
};
use tracing::{debug, info};

const AUTOCOMPLETE_LIMIT: usize = 5;
const SUGGESTION_GROUP: &str = "documents";

pub struct MemoryConnector {
    documents: Vec<SearchResult>,
    requests: AtomicU64,
}

impl MemoryConnector {
    pub fn new(documents: Vec<SearchResult>) -> Self {
        Self {
            documents,
            requests: AtomicU64::new(0),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read documents from '{}'", path.display()))?;
        let documents: Vec<SearchResult> = serde_json::from_str(&raw)
            .with_context(|| format!("'{}' is not a JSON array of documents", path.display()))?;
        info!(
            "memory_connector: loaded documents count={} path={}",
            documents.len(),
            path.display()
        );
        Ok(Self::new(documents))
    }

    fn next_request_id(&self) -> String {
        let request = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        format!("memory-{request}")
    }

    fn matching<'a>(
        &'a self,
        term: &str,
        search_fields: &'a BTreeMap<String, Value>,
    ) -> impl Iterator<Item = &'a SearchResult> + 'a {
        let needle = term.trim().to_lowercase();
        self.documents
            .iter()
            .filter(move |document| matches_term(document, &needle, search_fields))
    }
}

fn matches_term(
    document: &SearchResult,
    needle: &str,
    search_fields: &BTreeMap<String, Value>,
) -> bool {
    if needle.is_empty() {
        return true;
    }
    document
        .fields
        .iter()
        .filter(|(name, _)| search_fields.is_empty() || search_fields.contains_key(*name))
        .any(|(_, value)| text_of(value).any(|text| text.to_lowercase().contains(needle)))
}

fn text_of(value: &Value) -> impl Iterator<Item = &str> {
    let values: Vec<&str> = match value {
        Value::String(text) => vec![text.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    values.into_iter()
}

/// A range filter value (`{"from": .., "to": ..}`) matches numbers inside the
/// half-open range; any other value matches on equality or array membership.
fn value_matches(document_value: Option<&Value>, wanted: &Value) -> bool {
    let Some(document_value) = document_value else {
        return false;
    };
    if let Some(range) = wanted.as_object().filter(|range| {
        range.contains_key("from") || range.contains_key("to")
    }) {
        let Some(number) = document_value.as_f64() else {
            return false;
        };
        let above = range
            .get("from")
            .and_then(Value::as_f64)
            .map_or(true, |from| number >= from);
        let below = range
            .get("to")
            .and_then(Value::as_f64)
            .map_or(true, |to| number < to);
        return above && below;
    }
    match document_value {
        Value::Array(items) => items.iter().any(|item| filter_values_match(item, wanted)),
        other => filter_values_match(other, wanted),
    }
}

fn passes_filter(document: &SearchResult, filter: &Filter) -> bool {
    let field = document.fields.get(&filter.field);
    let mut hits = filter.values.iter().map(|value| value_matches(field, value));
    match filter.filter_type {
        FilterType::All => hits.all(|hit| hit),
        FilterType::Any => filter.values.is_empty() || hits.any(|hit| hit),
        FilterType::None => !hits.any(|hit| hit),
    }
}

fn compare_field(left: &SearchResult, right: &SearchResult, field: &str) -> CmpOrdering {
    match (left.fields.get(field), right.fields.get(field)) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        _ => CmpOrdering::Equal,
    }
}

/// Value counts for each configured facet field over the filtered hits.
fn facet_counts(
    hits: &[&SearchResult],
    facets: &BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    facets
        .keys()
        .map(|field| {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for hit in hits {
                let values = match hit.fields.get(field) {
                    Some(Value::Array(items)) => items.clone(),
                    Some(value) => vec![value.clone()],
                    None => Vec::new(),
                };
                for value in values {
                    let key = match value {
                        Value::String(text) => text,
                        other => other.to_string(),
                    };
                    *counts.entry(key).or_default() += 1;
                }
            }
            let data: Vec<Value> = counts
                .into_iter()
                .map(|(value, count)| json!({ "value": value, "count": count }))
                .collect();
            (field.clone(), json!([{ "field": field, "type": "value", "data": data }]))
        })
        .collect()
}

fn autocomplete_limit(section: &Value) -> usize {
    section
        .get("resultsPerPage")
        .and_then(Value::as_u64)
        .and_then(|limit| usize::try_from(limit).ok())
        .unwrap_or(AUTOCOMPLETE_LIMIT)
}

#[async_trait]
impl SearchConnector for MemoryConnector {
    async fn search(&self, state: &SearchState, query_config: &QueryConfig) -> Result<ResultBatch> {
        let mut hits: Vec<&SearchResult> = self
            .matching(&state.search_term, &query_config.search_fields)
            .filter(|document| state.filters.iter().all(|filter| passes_filter(document, filter)))
            .collect();

        if !state.sort_field.is_empty() {
            hits.sort_by(|left, right| compare_field(left, right, &state.sort_field));
            if state.sort_direction == SortDirection::Desc {
                hits.reverse();
            }
        }

        let facets = facet_counts(&hits, &query_config.facets);
        let total_results = hits.len() as u64;
        let skip = state.current.saturating_sub(1).saturating_mul(state.results_per_page);
        let results: Vec<SearchResult> = hits
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(state.results_per_page).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        let request_id = self.next_request_id();
        debug!(
            "memory_connector: search term={:?} total_results={total_results} page_len={} request_id={request_id}",
            state.search_term,
            results.len()
        );
        Ok(ResultBatch {
            results,
            total_results,
            facets,
            request_id: Some(request_id),
        })
    }

    async fn autocomplete(
        &self,
        term: &str,
        query_config: &AutocompleteQueryConfig,
    ) -> Result<AutocompleteResponse> {
        let no_fields = BTreeMap::new();
        let results: Option<Vec<SearchResult>> = query_config.results.as_ref().map(|section| {
            self.matching(term, &no_fields)
                .take(autocomplete_limit(section))
                .cloned()
                .collect()
        });

        let suggestions = query_config.suggestions.as_ref().map(|section| {
            let needle = term.trim().to_lowercase();
            let mut seen: Vec<String> = Vec::new();
            for document in &self.documents {
                for value in document.fields.values() {
                    for text in text_of(value) {
                        let lowered = text.to_lowercase();
                        if lowered.starts_with(&needle) && !seen.contains(&lowered) {
                            seen.push(lowered);
                        }
                    }
                }
            }
            seen.sort();
            seen.truncate(autocomplete_limit(section));
            let group: Vec<Suggestion> = seen.into_iter().map(Suggestion::new).collect();
            BTreeMap::from([(SUGGESTION_GROUP.to_string(), group)])
        });

        Ok(AutocompleteResponse {
            results,
            suggestions,
            request_id: Some(self.next_request_id()),
        })
    }

    async fn click(&self, event: &ClickEvent) -> Result<()> {
        info!(
            "memory_connector: click document_id={} query={:?} request_id={}",
            event.document_id, event.query, event.request_id
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/memory_connector_tests.rs"]
mod tests;
