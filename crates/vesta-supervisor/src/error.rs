//! Supervisor error types.

use std::any::Any;
use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vesta_kernel::{panic_message, SpawnError};
use vesta_registry::RegistryError;
use vesta_session::StateError;
use vesta_vfs::VfsError;

/// Boot could not complete.
#[derive(Debug, Error)]
pub enum BootError {
    /// A system process could not be spawned
    #[error("boot failed: {0}")]
    Spawn(#[from] SpawnError),

    /// The configured initial state does not exist
    #[error("boot failed: unknown initial state {0}")]
    UnknownState(String),
}

/// User account failures.
#[derive(Debug, Error)]
pub enum UserError {
    /// Empty names or names that cannot be used as a registry key
    #[error("invalid username {0:?}")]
    InvalidName(String),

    /// The account store could not be updated
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A user folder or preferences file could not be written
    #[error(transparent)]
    Storage(#[from] VfsError),

    /// Preferences could not be serialized
    #[error("preferences: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Why the runtime crashed, as handed to the crash state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashReason {
    /// Human-readable description
    pub message: String,
    /// Short machine-readable kind
    pub kind: String,
}

impl CrashReason {
    /// Create a crash reason.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Describe an error returned by a guarded task or a state script.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        match err.downcast_ref::<StateError>() {
            Some(state) => Self::new(state.kind(), state.to_string()),
            None => Self::new("Error", err.to_string()),
        }
    }

    /// Describe a panic payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::new("Panic", panic_message(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_errors_keep_their_kind() {
        let err = StateError::UnknownState(String::from("nowhere"));
        let reason = CrashReason::from_error(&err);

        assert_eq!(reason.kind, "UnknownState");
        assert_eq!(reason.message, "unknown state nowhere");
    }

    #[test]
    fn test_other_errors() {
        let err: Box<dyn StdError> = "disk on fire".into();
        let reason = CrashReason::from_error(err.as_ref());

        assert_eq!(reason, CrashReason::new("Error", "disk on fire"));
    }

    #[test]
    fn test_panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("oops"));
        assert_eq!(CrashReason::from_panic(payload.as_ref()).message, "oops");
    }
}
