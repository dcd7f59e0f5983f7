//! Error Types for Vesta Apps
//!
//! Defines errors that can occur while loading or running applications.

use vesta_kernel::{DescriptorError, ProcessError, SpawnError};

/// Errors that can occur in app loading and execution.
#[derive(Clone, Debug, thiserror::Error)]
pub enum AppError {
    /// Resources or configuration could not be loaded.
    #[error("application load error: {0}")]
    Load(String),

    /// The application failed while running.
    #[error("application runtime error: {0}")]
    Runtime(String),

    /// No application with this id is in the catalog.
    #[error("application not found: {0}")]
    NotFound(String),

    /// The descriptor failed validation.
    #[error("invalid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    /// The process table refused the spawn.
    #[error("spawn failed: {0}")]
    Spawn(#[from] SpawnError),
}

impl AppError {
    /// Create a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Create a load error.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }
}

impl From<AppError> for ProcessError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Runtime(msg) => ProcessError::Runtime(msg),
            AppError::Spawn(inner) => ProcessError::Failed(inner.to_string()),
            other => ProcessError::Load(other.to_string()),
        }
    }
}
