use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::ParseError, filters::normalize_filters};

pub const DEFAULT_CURRENT: u64 = 1;
pub const DEFAULT_RESULTS_PER_PAGE: u64 = 20;

/// Filter values are opaque to the driver: plain strings, numbers or range objects
/// are all forwarded to the connector as-is.
pub type FilterValue = Value;

/// A single hit. Only `id` is interpreted (click tracking); every other field is
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SearchResult {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            fields: Map::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Suggestion {
    pub fn new(suggestion: impl Into<String>) -> Self {
        Self {
            suggestion: suggestion.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    #[default]
    All,
    Any,
    None,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
            Self::None => "none",
        }
    }
}

impl FromStr for FilterType {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            "none" => Ok(Self::None),
            other => Err(ParseError::FilterType(other.to_string())),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(default)]
    pub values: Vec<FilterValue>,
    #[serde(rename = "type", default)]
    pub filter_type: FilterType,
}

impl Filter {
    pub fn new(
        field: impl Into<String>,
        values: Vec<FilterValue>,
        filter_type: FilterType,
    ) -> Self {
        Self {
            field: field.into(),
            values,
            filter_type,
        }
    }
}

/// `Unset` serializes as the empty string so a snapshot round-trips through the
/// same JSON shape UI layers already consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(Self::Unset),
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ParseError::SortDirection(other.to_string())),
        }
    }
}

/// The canonical snapshot. Snapshots are never mutated in place once published;
/// every transition produces a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchState {
    pub search_term: String,
    pub result_search_term: String,
    pub current: u64,
    pub results_per_page: u64,
    pub filters: Vec<Filter>,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub results: Vec<SearchResult>,
    pub total_results: u64,
    pub total_pages: u64,
    pub facets: BTreeMap<String, Value>,
    pub request_id: String,
    pub was_searched: bool,
    pub autocompleted_results: Vec<SearchResult>,
    pub autocompleted_results_request_id: String,
    pub autocompleted_suggestions: BTreeMap<String, Vec<Suggestion>>,
    pub autocompleted_suggestions_request_id: String,
    pub is_loading: bool,
    pub error: String,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            result_search_term: String::new(),
            current: DEFAULT_CURRENT,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            filters: Vec::new(),
            sort_field: String::new(),
            sort_direction: SortDirection::Unset,
            results: Vec::new(),
            total_results: 0,
            total_pages: 0,
            facets: BTreeMap::new(),
            request_id: String::new(),
            was_searched: false,
            autocompleted_results: Vec::new(),
            autocompleted_results_request_id: String::new(),
            autocompleted_suggestions: BTreeMap::new(),
            autocompleted_suggestions_request_id: String::new(),
            is_loading: false,
            error: String::new(),
        }
    }
}

impl SearchState {
    /// The user-controlled portion of the state: what a URL or a reset carries.
    pub fn search_parameters(&self) -> PartialSearchState {
        PartialSearchState {
            search_term: Some(self.search_term.clone()),
            current: Some(self.current),
            results_per_page: Some(self.results_per_page),
            filters: Some(self.filters.clone()),
            sort_field: Some(self.sort_field.clone()),
            sort_direction: Some(self.sort_direction),
            ..PartialSearchState::default()
        }
    }

    pub fn filter(&self, field: &str) -> Option<&Filter> {
        self.filters.iter().find(|filter| filter.field == field)
    }

    pub fn has_search_parameters(&self) -> bool {
        !self.search_term.is_empty() || !self.filters.is_empty()
    }
}

pub fn page_count(total_results: u64, results_per_page: u64) -> u64 {
    if results_per_page == 0 {
        return 0;
    }
    total_results.div_ceil(results_per_page)
}

macro_rules! partial_state {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// A field-by-field transition over [`SearchState`]. `None` leaves the
        /// field as it is.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        pub struct PartialSearchState {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl PartialSearchState {
            fn merge_into(self, state: &mut SearchState) {
                $(
                    if let Some(value) = self.$field {
                        state.$field = value;
                    }
                )*
            }

            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())*
            }

            /// A transition that sets every field to `state`'s value.
            pub fn from_state(state: SearchState) -> Self {
                Self {
                    $($field: Some(state.$field),)*
                }
            }

            /// Field-wise overlay; fields set in `over` win.
            pub fn overlay(self, over: PartialSearchState) -> PartialSearchState {
                PartialSearchState {
                    $($field: over.$field.or(self.$field),)*
                }
            }
        }
    };
}

partial_state! {
    search_term: String,
    result_search_term: String,
    current: u64,
    results_per_page: u64,
    filters: Vec<Filter>,
    sort_field: String,
    sort_direction: SortDirection,
    results: Vec<SearchResult>,
    total_results: u64,
    total_pages: u64,
    facets: BTreeMap<String, Value>,
    request_id: String,
    was_searched: bool,
    autocompleted_results: Vec<SearchResult>,
    autocompleted_results_request_id: String,
    autocompleted_suggestions: BTreeMap<String, Vec<Suggestion>>,
    autocompleted_suggestions_request_id: String,
    is_loading: bool,
    error: String,
}

impl PartialSearchState {
    pub fn apply_to(mut self, state: &mut SearchState) {
        if let Some(filters) = self.filters.take() {
            state.filters = normalize_filters(filters);
        }
        self.merge_into(state);
    }

    /// Keeps only the fields a URL or an initial configuration may seed.
    pub fn search_parameters_only(self) -> PartialSearchState {
        PartialSearchState {
            search_term: self.search_term,
            current: self.current,
            results_per_page: self.results_per_page,
            filters: self.filters,
            sort_field: self.sort_field,
            sort_direction: self.sort_direction,
            ..PartialSearchState::default()
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
