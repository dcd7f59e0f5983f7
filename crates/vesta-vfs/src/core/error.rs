//! Error types for the storage layer.

use thiserror::Error;

/// Errors from storage adapter operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VfsError {
    /// Path not found
    #[error("not found: {0}")]
    NotFound(String),

    /// A file sits where a directory was expected
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A directory sits where a file was expected
    #[error("not a file: {0}")]
    NotAFile(String),

    /// Invalid path format
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Host I/O failure
    #[error("i/o error: {0}")]
    Io(String),

    /// No usable storage root on this host
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl VfsError {
    /// Create a not-found error for `path`.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an I/O error with message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create an invalid path error with message.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}

impl From<std::io::Error> for VfsError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound(err.to_string()),
            _ => VfsError::Io(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        assert_eq!(VfsError::io("disk full"), VfsError::Io(String::from("disk full")));
        assert_eq!(
            VfsError::not_found("/a").to_string(),
            "not found: /a"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(VfsError::not_found("/x").is_not_found());
        assert!(!VfsError::io("boom").is_not_found());
    }

    #[test]
    fn test_from_io_error() {
        let err: VfsError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());

        let err: VfsError = std::io::Error::new(std::io::ErrorKind::Other, "nope").into();
        assert!(matches!(err, VfsError::Io(_)));
    }
}
