//! Error types for pam-tree

use std::path::PathBuf;

/// Result type for pam-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pam-tree operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The stack file does not parse under the selected grammar
    #[error("Failed to load {path}: line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid query '{query}': {message}")]
    InvalidQuery { query: String, message: String },

    #[error("Path not found: {path}")]
    PathNotFound { path: String },

    #[error("Cannot modify {path}: {reason}")]
    InvalidEdit { path: String, reason: String },

    #[error("Cannot render node {label}: {message}")]
    Render { label: String, message: String },

    #[error(transparent)]
    Fs(#[from] pam_fs::Error),
}

impl Error {
    pub fn invalid_query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            query: query.into(),
            message: message.into(),
        }
    }

    pub fn path_not_found(path: impl ToString) -> Self {
        Self::PathNotFound {
            path: path.to_string(),
        }
    }
}
