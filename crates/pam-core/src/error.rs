//! Error types for pam-core

use std::path::PathBuf;

/// Result type for pam-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pam-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The target stack file does not parse
    #[error("Failed to load {path}: line {line}: {message}")]
    Load {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A position directive could not be understood
    #[error("Invalid position '{position}': {message}")]
    InvalidPosition { position: String, message: String },

    /// A declaration is incomplete or inconsistent
    #[error("Invalid declaration: {message}")]
    InvalidDeclaration { message: String },

    /// An update matched more than one node
    #[error("{count} entries in {path} match {identity}; refusing to update an ambiguous entry")]
    IdentityConflict {
        path: PathBuf,
        identity: String,
        count: usize,
    },

    /// A tree edit failed mid-transaction; nothing was written
    #[error("Failed to update {path}: {source}")]
    Transaction {
        path: PathBuf,
        #[source]
        source: pam_tree::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Tree error from pam-tree
    #[error(transparent)]
    Tree(#[from] pam_tree::Error),

    /// Filesystem error from pam-fs
    #[error(transparent)]
    Fs(#[from] pam_fs::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn invalid_declaration(message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            message: message.into(),
        }
    }

    pub fn invalid_position(position: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPosition {
            position: position.into(),
            message: message.into(),
        }
    }

    /// Tag a failure from inside a transaction with the target path.
    pub(crate) fn in_transaction(self, path: PathBuf) -> Self {
        match self {
            Self::Tree(pam_tree::Error::Parse {
                path,
                line,
                message,
            }) => Self::Load {
                path,
                line,
                message,
            },
            Self::Tree(source) => Self::Transaction { path, source },
            other => other,
        }
    }
}
