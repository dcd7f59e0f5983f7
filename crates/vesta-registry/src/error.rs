//! Registry error types.

use thiserror::Error;

/// Errors from registry reads and writes.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The dot-path is empty or has an empty segment
    #[error("invalid registry path: {0:?}")]
    InvalidPath(String),

    /// Descending the path hit a value that is not an object
    #[error("registry node {path} is not an object")]
    NotAnObject {
        /// Dotted path of the offending node
        path: String,
    },

    /// The value could not be converted to or from JSON
    #[error("registry value at {path}: {source}")]
    Serde {
        /// Dotted path being read or written
        path: String,
        /// Underlying conversion error
        #[source]
        source: serde_json::Error,
    },
}
