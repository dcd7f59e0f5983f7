//! Kernel error types.

use std::any::Any;

use thiserror::Error;

/// Failures reported by process hooks.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    /// A lifecycle hook failed or declined
    #[error("{0}")]
    Failed(String),

    /// A windowed process could not load its resources
    #[error("application load error: {0}")]
    Load(String),

    /// A windowed process crashed while running
    #[error("application runtime error: {0}")]
    Runtime(String),

    /// The process was disposed
    #[error("process disposed")]
    Disposed,
}

impl ProcessError {
    /// Create a generic hook failure.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Whether this only signals that the process went away.
    pub fn is_disposed(&self) -> bool {
        matches!(self, ProcessError::Disposed)
    }

    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::Failed(_) => "ProcessError",
            ProcessError::Load(_) => "AppLoadError",
            ProcessError::Runtime(_) => "AppRuntimeError",
            ProcessError::Disposed => "Disposed",
        }
    }
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("panic")
    }
}

/// Why a spawn produced no process.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    /// The runtime is crashing; nothing new may start
    #[error("spawn of {name} refused: runtime is crashing")]
    Crashing {
        /// Requested process name
        name: String,
    },

    /// The process could not be constructed
    #[error("failed to construct {name}: {source}")]
    Build {
        /// Requested process name
        name: String,
        /// Construction failure
        #[source]
        source: ProcessError,
    },

    /// `start()` declined
    #[error("{name} declined to start: {source}")]
    StartRefused {
        /// Requested process name
        name: String,
        /// Start hook failure
        #[source]
        source: ProcessError,
    },
}

/// Descriptor validation failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// A required path is absent or null
    #[error("missing required field {0}")]
    MissingField(String),

    /// A required string is empty
    #[error("field {0} must not be empty")]
    EmptyField(String),

    /// A size is negative or not finite
    #[error("invalid size {0}")]
    InvalidSize(String),

    /// Neither centered nor both coordinates given
    #[error("attempted to create a window without a valid position")]
    InvalidPosition,

    /// The JSON does not match the descriptor shape
    #[error("malformed descriptor: {0}")]
    Malformed(String),
}
