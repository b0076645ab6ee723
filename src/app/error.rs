use thiserror::Error;

use crate::scraper::SelectorError;

#[derive(Error, Debug)]
pub enum FeedwatchError {
    #[error("{0}")]
    Fetch(String),

    #[error("{0}")]
    Parse(String),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("Seen store unavailable: {0}")]
    SeenStore(String),

    #[error("{0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FeedwatchError>;
