//! Error taxonomy for file operations.
//!
//! Every variant is recoverable: the dispatcher renders it through the message
//! catalog and the conversation carries on. Application plumbing (config,
//! startup, transport) uses `anyhow` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileOpError {
    /// Resolved path escapes the storage area (or could not be resolved at all).
    #[error("path outside the base directory: {0}")]
    OutOfBounds(String),

    #[error("does not exist: {0}")]
    NotFound(String),

    /// Destination already occupied. This bot never overwrites.
    #[error("an entry with that name already exists at the destination (directory: {is_dir})")]
    Collision { is_dir: bool },

    #[error("the base directory cannot be deleted, moved or renamed")]
    BaseDirectoryProtected,

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("a directory cannot be moved inside itself")]
    IntoItself,

    #[error("number out of range (1-{max})")]
    Range { max: usize },

    #[error("expected a number")]
    Format,

    #[error("file exceeds the transport limit of {limit} bytes")]
    TransportLimit { limit: u64 },

    #[error("file name is empty after sanitizing")]
    EmptyName,

    #[error("destination is the same as the source")]
    NoOp,

    #[error("destination directory does not exist")]
    MissingParent,

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type FileOpResult<T> = std::result::Result<T, FileOpError>;
