//! Serializable search state and the payloads exchanged with search backends.

pub mod domain;
pub mod error;
pub mod filters;
pub mod protocol;

pub use domain::{
    Filter, FilterType, FilterValue, PartialSearchState, SearchResult, SearchState, SortDirection,
    Suggestion,
};
pub use protocol::{
    AutocompleteQueryConfig, AutocompleteResponse, ClickEvent, QueryConfig, ResultBatch,
};
