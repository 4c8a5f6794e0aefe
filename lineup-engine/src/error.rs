//! Engine error taxonomy.

use std::path::{Path, PathBuf};

use lineup_core::types::{ItemType, TermId};
use lineup_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("permission denied for {action}")]
    PermissionDenied { action: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("term {term_id} does not exist")]
    TermNotFound { term_id: TermId },

    #[error("ordering is not enabled for item type '{item_type}'")]
    TypeNotEnabled { item_type: ItemType },
}

pub(crate) fn io_err(path: &Path, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.to_path_buf(),
        source,
    }
}
