use veil_types::{FilterId, TypeError};

/// Errors from filter evaluation and configuration.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// No rules are registered under this filter id.
    #[error("unknown filter: {0:?}")]
    UnknownFilter(FilterId),

    /// The filter configuration could not be parsed or validated.
    #[error("invalid filter config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// The filter backend failed while evaluating a path.
    #[error("filter backend error: {0}")]
    Backend(String),
}

pub type FilterResult<T> = Result<T, FilterError>;
