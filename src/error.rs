use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cannot read input file {}: {source}", path.display())]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Input file {} has no header line", .0.display())]
    EmptyInput(PathBuf),

    #[error("Input header is missing required column: {0}")]
    MissingColumn(String),

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Remote ledger responded with {status}: {body}")]
    Remote { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Row-level failure while building the outbound transaction. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("unparseable date {0:?}")]
    InvalidDate(String),

    #[error("local time {0:?} does not exist in the configured time zone")]
    NonexistentLocalTime(String),

    #[error("unparseable amount {0:?}")]
    InvalidAmount(String),
}

/// Row-level failure of the create call. Never fatal, never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),
}
