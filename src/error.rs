//! Error taxonomy shared by the engine, the profile store and the advisor.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by ballistics operations.
#[derive(Debug, Error)]
pub enum BallisticsError {
    /// Invalid caller input: step size, non-positive physical quantities,
    /// unsupported drag model names.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A stored or imported payload is missing fields or has bad values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Disk I/O failed.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A store document could not be reconciled with any known schema.
    #[error("migration error: {0}")]
    Migration(String),

    /// A sensor metric value could not be parsed.
    #[error("metric parse error: {0}")]
    MetricParse(#[from] crate::sensors::MetricParseError),

    /// JSON encoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV encoding failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl BallisticsError {
    /// Wrap an I/O error with the path it happened on.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BallisticsError::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        BallisticsError::Configuration(msg.into())
    }
}

/// Result alias for ballistics operations.
pub type Result<T> = std::result::Result<T, BallisticsError>;
