use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::SourceKey;

/// Error type for resource-availability failures across the pipeline stages.
///
/// Schema gaps and malformed values never surface here: the mapper and the
/// table reader absorb them by coercion.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required upstream file does not exist.
    #[error("missing input file: {}", path.display())]
    MissingInput {
        /// Path that was expected.
        path: PathBuf,
    },
    /// Storage settings are absent.
    #[error("missing storage settings: {}", missing.join(", "))]
    CredentialMissing {
        /// Every missing variable name.
        missing: Vec<String>,
    },
    /// The worker pool could not be built.
    #[error("processing engine failed to start: {0}")]
    EngineStartup(String),
    /// Dataset acquisition failed.
    #[error("dataset source '{source_key}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Registry key of the dataset.
        source_key: SourceKey,
        /// Underlying failure.
        reason: String,
    },
    /// The key is not registered.
    #[error("unknown dataset key '{0}'")]
    UnknownSource(String),
    /// A parquet, CSV or JSON file could not be read or written.
    #[error("table {} could not be processed: {reason}", path.display())]
    Table {
        /// File being processed.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },
    /// An object-storage call failed.
    #[error("object storage failure: {0}")]
    Storage(String),
    /// Invalid option values.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<object_store::Error> for PipelineError {
    fn from(err: object_store::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl PipelineError {
    pub(crate) fn table(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Table {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
