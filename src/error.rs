//! Error types for fall-trace

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building scenarios or writing traces
#[derive(Debug, Error)]
pub enum FallTraceError {
    #[error("Invalid phase table: {0}")]
    InvalidPhaseTable(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl FallTraceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FallTraceError::Io {
            path: path.into(),
            source,
        }
    }
}
