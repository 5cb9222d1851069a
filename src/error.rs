//! Error types for ownership-flow

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for the ownership pipeline
///
/// Only fatal conditions live here. Bad dates, non-numeric holdings and
/// missing categories are normalised away by the pipeline stages and never
/// surface as errors.
#[derive(Error, Debug)]
pub enum OwnershipError {
    /// No input files found, or a file could not be parsed with the
    /// configured delimiter
    #[error("Data source error ({}): {}", .path.display(), .reason)]
    DataSource { path: PathBuf, reason: String },

    /// A required column is absent from every loaded file
    #[error("Schema error: required column '{column}' not found in {context}")]
    Schema { column: String, context: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl OwnershipError {
    /// Build a [`OwnershipError::DataSource`] for the given path
    pub fn data_source(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::DataSource {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Build a [`OwnershipError::Schema`] for a missing column
    pub fn schema(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
            context: context.into(),
        }
    }

    pub fn is_data_source(&self) -> bool {
        matches!(self, Self::DataSource { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

/// Result type alias for ownership-flow operations
pub type Result<T> = std::result::Result<T, OwnershipError>;
