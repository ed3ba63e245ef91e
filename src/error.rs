//! Load errors for settings and scene files

use std::path::PathBuf;

use thiserror::Error;

/// Failure reading, decoding or validating a JSON file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scene: {0}")]
    InvalidScene(String),
}
