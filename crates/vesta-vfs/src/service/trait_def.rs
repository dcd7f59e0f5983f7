//! StorageAdapter trait definition.

use crate::core::{DirListing, VfsError};

/// Storage adapter interface used by the runtime.
///
/// Adapters are synchronous. Every path argument goes through
/// [`normalize_path`](crate::normalize_path) inside the adapter.
pub trait StorageAdapter {
    // ========== File Operations ==========

    /// Write a file (create or overwrite), creating parent directories as needed.
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), VfsError>;

    /// Read a file. Fails with [`VfsError::NotFound`] when absent.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &str) -> Result<String, VfsError> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| VfsError::io(e.to_string()))
    }

    // ========== Directory Operations ==========

    /// Create a directory and all parent directories. Existing directories are fine.
    fn create_directory(&self, path: &str) -> Result<(), VfsError>;

    /// List a directory.
    fn read_directory(&self, path: &str) -> Result<DirListing, VfsError>;

    // ========== Metadata Operations ==========

    /// Check whether anything exists at `path`.
    fn exists(&self, path: &str) -> bool;
}
