#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("Unknown category: {category}{}", subcategory.as_deref().map(|s| format!("/{s}")).unwrap_or_default())]
    UnknownCategory {
        category: String,
        subcategory: Option<String>,
    },

    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Market data source is no longer running")]
    Closed,
}

pub type Result<T> = std::result::Result<T, MarketError>;
