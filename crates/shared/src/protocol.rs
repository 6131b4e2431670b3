use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{SearchResult, Suggestion};

/// Query-shaping metadata. The driver never interprets it; connectors do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryConfig {
    pub facets: BTreeMap<String, Value>,
    pub conditional_facets: BTreeMap<String, Value>,
    pub disjunctive_facets: Vec<String>,
    pub disjunctive_facets_analytics_tags: Vec<String>,
    pub result_fields: BTreeMap<String, Value>,
    pub search_fields: BTreeMap<String, Value>,
}

/// Which autocomplete sub-kinds a connector call should produce. A `None`
/// section is not requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutocompleteQueryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Value>,
}

impl AutocompleteQueryConfig {
    pub fn results_only(&self) -> Self {
        Self {
            results: Some(section_or_empty(&self.results)),
            suggestions: None,
        }
    }

    pub fn suggestions_only(&self) -> Self {
        Self {
            results: None,
            suggestions: Some(section_or_empty(&self.suggestions)),
        }
    }
}

fn section_or_empty(section: &Option<Value>) -> Value {
    section
        .clone()
        .unwrap_or_else(|| Value::Object(Default::default()))
}

/// An empty batch is a valid answer, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultBatch {
    pub results: Vec<SearchResult>,
    pub total_results: u64,
    pub facets: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutocompleteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SearchResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<BTreeMap<String, Vec<Suggestion>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub query: String,
    pub document_id: String,
    pub request_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}
