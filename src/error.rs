//! Error type shared by every data dictionary operation.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataDictError {
    /// Invalid parameter combination, missing argument or missing backing file.
    #[error("{0}")]
    Config(String),

    /// The dictionary content violates one of its invariants.
    #[error("{0}")]
    Validation(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to decode {path:?} with encoding {encoding}")]
    Decode { path: PathBuf, encoding: String },
}

impl DataDictError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, DataDictError>;
