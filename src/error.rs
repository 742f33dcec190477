//! Centralized error types for msgforge.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the msgforge library.
#[derive(Error, Debug)]
pub enum MsgError {
    /// An attachment with the same (case-insensitive) file name already exists.
    #[error("Duplicate attachment name: {0}")]
    DuplicateAttachment(String),

    /// An inline attachment was added without a content id.
    #[error("Inline attachment '{0}' requires a content id")]
    MissingContentId(String),

    /// The attachment file name is empty after stripping directories.
    #[error("Invalid attachment file name: '{0}'")]
    InvalidFileName(String),

    /// An attachment was built without a byte source.
    #[error("Attachment '{0}' has no data source")]
    MissingSource(String),

    /// The attachment's byte source could not be opened or read.
    #[error("Cannot read attachment '{name}': {source}")]
    AttachmentRead {
        name: String,
        source: std::io::Error,
    },

    /// A recipient is missing required fields.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The same property tag was supplied twice for one entity.
    #[error("Duplicate property 0x{id:04X} ({name})")]
    DuplicateProperty { id: u16, name: &'static str },

    /// A value's runtime type does not match the tag's declared type code.
    #[error("Property {name} expects {expected}, got {found}")]
    TypeMismatch {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// The property id is not in the registry.
    #[error("Unknown property id 0x{0:04X}")]
    UnknownProperty(u16),

    /// The underlying container refused to create a storage or stream.
    #[error("Container error at '{path}': {source}")]
    Storage {
        path: String,
        source: std::io::Error,
    },

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested operation is not supported.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Convenience alias for `Result<T, MsgError>`.
pub type Result<T> = std::result::Result<T, MsgError>;

impl MsgError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Storage` variant for a container node.
    pub fn storage(path: impl ToString, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.to_string(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `MsgError::io`).
impl From<std::io::Error> for MsgError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
