//! Session error types.

use thiserror::Error;

/// Error type returned by behavior scripts.
pub type ScriptError = Box<dyn std::error::Error>;

/// The stage could not fetch a resource.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to fetch {resource}: {reason}")]
pub struct StageError {
    /// Resource that failed
    pub resource: String,
    /// Host-supplied reason
    pub reason: String,
}

impl StageError {
    /// Create a stage error.
    pub fn new(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

/// State machine failures.
#[derive(Debug, Error)]
pub enum StateError {
    /// A descriptor field is empty
    #[error("attempted state load without valid metadata: {field} is empty")]
    InvalidDescriptor {
        /// Offending field
        field: &'static str,
    },

    /// No state with this key
    #[error("unknown state {0}")]
    UnknownState(String),

    /// The markup could not be fetched
    #[error("{state}: failed to load state markup")]
    MissingResource {
        /// State id
        state: String,
        /// Fetch failure
        #[source]
        source: StageError,
    },

    /// No entry function registered for the state's script
    #[error("{state}: no entry function for {script}")]
    MissingEntry {
        /// State id
        state: String,
        /// Script key
        script: String,
    },

    /// The behavior script failed
    #[error("{state}: {source}")]
    Script {
        /// State id
        state: String,
        /// Script failure
        #[source]
        source: ScriptError,
    },
}

impl StateError {
    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StateError::InvalidDescriptor { .. } => "InvalidDescriptor",
            StateError::UnknownState(_) => "UnknownState",
            StateError::MissingResource { .. } => "MissingResource",
            StateError::MissingEntry { .. } => "MissingEntry",
            StateError::Script { .. } => "ScriptError",
        }
    }
}
