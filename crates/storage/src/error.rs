//! Storage errors.

use benchwatch_core::DecodeError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the artifact file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading, writing or renaming failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold a valid ledger.
    #[error("cannot decode {}: {source}", .path.display())]
    Decode {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: DecodeError,
    },

    /// No artifact at the given path.
    #[error("no benchmark data at {}", .0.display())]
    NotFound(PathBuf),

    /// Refusing to overwrite an existing artifact.
    #[error("benchmark data already exists at {}", .0.display())]
    AlreadyExists(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
