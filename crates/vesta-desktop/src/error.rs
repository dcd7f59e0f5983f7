//! Desktop error types.

use thiserror::Error;
use vesta_kernel::ProcessError;

/// The host could not provide a presentation bundle.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to load {resource}: {reason}")]
pub struct BundleError {
    /// Resource that failed
    pub resource: String,
    /// Host-supplied reason
    pub reason: String,
}

impl BundleError {
    /// Create a bundle error.
    pub fn new(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the surface synchronizer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RendererError {
    /// The host document has no element to render into
    #[error("render target {0} not found")]
    MissingRenderTarget(String),

    /// The renderer process has been killed
    #[error("renderer is disposed")]
    Disposed,

    /// Neither centered nor both coordinates given
    #[error("{app_id}: attempted to create a window without a valid position")]
    InvalidPosition {
        /// Offending application
        app_id: String,
    },

    /// Presentation bundle failure
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// The supervised process failed
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl RendererError {
    /// Whether this only means the supervised process went away.
    pub fn is_process_disposed(&self) -> bool {
        matches!(self, RendererError::Process(ProcessError::Disposed))
    }
}
