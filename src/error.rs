//! Error types for Hente.

use thiserror::Error;

/// Library-level error type for Hente operations.
#[derive(Error, Debug)]
pub enum HenteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch engine error: {0}")]
    Fetch(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Hente operations.
pub type Result<T> = std::result::Result<T, HenteError>;
