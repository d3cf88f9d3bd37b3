//! Error types for the store.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::SessionId;

#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O operation failed (directory creation, append, archive write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encode or decode failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A ledger line could not be replayed on open.
    #[error("Corrupt record in {path} at line {line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// The configured directory is unusable.
    #[error("Store validation error: {0}")]
    Validation(String),
}

impl StoreError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
