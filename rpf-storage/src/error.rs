//! Error types for registry operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("registry is not initialized")]
    NotInitialized,

    #[error("archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("entry '{path}' not found in {archive}")]
    EntryNotFound { archive: String, path: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parser(#[from] rpf_parser::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
