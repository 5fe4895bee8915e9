/*!
 * VFS Error Types
 * Structured, type-safe error handling for disk and path operations
 */

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// VFS operation result
///
/// # Must Use
/// VFS operations can fail and must be handled to prevent data loss
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// VFS errors
///
/// `Display` output is the message handed back to scripts, so every variant
/// reads as a complete sentence fragment. Serialization uses the tagged enum
/// pattern.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Invalid path: {0}")]
    InvalidPath(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Relative paths are not supported: {0}")]
    UnsupportedRelativePath(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Can't access files outside of base directory: {0}")]
    SandboxEscape(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Disk not found: {0}")]
    DiskNotFound(String),

    #[error("Disk is not writeable: {0}")]
    DiskNotWriteable(String),

    #[error("Disk name is reserved or malformed: {0}")]
    ReservedDiskName(String),

    #[error("Not found: {0}")]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already exists: {0}")]
    AlreadyExists(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Directory not empty: {0}")]
    NotEmpty(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not a directory: {0}")]
    NotADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Is a directory: {0}")]
    IsADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid file mode: {0}")]
    InvalidMode(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("File handle is closed")]
    HandleClosed,

    #[error("Stream is not readable")]
    NotReadable,

    #[error("Stream is not writeable")]
    NotWriteable,

    #[error("Invalid archive manifest: {0}")]
    Manifest(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("I/O error: {0}")]
    Io(#[serde(deserialize_with = "deserialize_nonempty_string")] String),
}

/// Error classes reported across the scripting boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Path,
    Disk,
    NotFound,
    Conflict,
    Handle,
    Io,
}

impl VfsError {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            VfsError::InvalidPath(_)
            | VfsError::UnsupportedRelativePath(_)
            | VfsError::SandboxEscape(_) => ErrorKind::Path,
            VfsError::DiskNotFound(_)
            | VfsError::DiskNotWriteable(_)
            | VfsError::ReservedDiskName(_) => ErrorKind::Disk,
            VfsError::NotFound(_) | VfsError::NotADirectory(_) | VfsError::IsADirectory(_) => {
                ErrorKind::NotFound
            }
            VfsError::AlreadyExists(_) | VfsError::NotEmpty(_) => ErrorKind::Conflict,
            VfsError::InvalidMode(_)
            | VfsError::HandleClosed
            | VfsError::NotReadable
            | VfsError::NotWriteable => ErrorKind::Handle,
            VfsError::Manifest(_) | VfsError::Io(_) => ErrorKind::Io,
        }
    }

    /// Convert std::io::Error to VfsError, keeping the operation as context
    pub fn from_io(e: std::io::Error, context: impl Into<String>) -> Self {
        use std::io::ErrorKind as Io;
        let context = context.into();
        match e.kind() {
            Io::NotFound => VfsError::NotFound(context),
            Io::AlreadyExists => VfsError::AlreadyExists(context),
            Io::DirectoryNotEmpty => VfsError::NotEmpty(context),
            Io::NotADirectory => VfsError::NotADirectory(context),
            Io::IsADirectory => VfsError::IsADirectory(context),
            _ => VfsError::Io(format!("{}: {}", context, e)),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Path => write!(f, "path error"),
            ErrorKind::Disk => write!(f, "disk error"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Handle => write!(f, "handle error"),
            ErrorKind::Io => write!(f, "I/O error"),
        }
    }
}

/// Deserialize and validate non-empty string for error messages
pub(super) fn deserialize_nonempty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("error message must not be empty"));
    }
    Ok(s)
}
