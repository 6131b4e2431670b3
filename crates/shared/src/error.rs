use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown filter type `{0}`")]
    FilterType(String),
    #[error("unknown sort direction `{0}`")]
    SortDirection(String),
}
