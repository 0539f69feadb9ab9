//! Error types for the strata core library.

use std::path::PathBuf;

/// Top-level error enum for the strata core library.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StrataResult<T> = Result<T, StrataError>;
