//! Core kernel types
//!
//! Identifiers, per-process bookkeeping and table entries.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::process::{Process, WindowedProcess};

/// Process identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bookkeeping shared by every process.
///
/// Created by the handler at spawn time and handed to the process builder.
#[derive(Debug)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: ProcessId,
    /// Spawning parent, if any
    pub parent: Option<ProcessId>,
    /// Human-readable name (the app id for windowed processes)
    pub name: String,
    /// Refuses non-forced termination
    critical: Cell<bool>,
    /// Terminal flag, set by `kill`
    disposed: Cell<bool>,
}

impl ProcessInfo {
    /// Create bookkeeping for a freshly allocated pid.
    pub fn new(pid: ProcessId, parent: Option<ProcessId>, name: impl Into<String>) -> Self {
        Self {
            pid,
            parent,
            name: name.into(),
            critical: Cell::new(false),
            disposed: Cell::new(false),
        }
    }

    /// Mark the process critical (builder style).
    pub fn critical(self) -> Self {
        self.critical.set(true);
        self
    }

    /// Whether the process refuses non-forced termination.
    pub fn is_critical(&self) -> bool {
        self.critical.get()
    }

    /// Whether the process has been killed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn mark_disposed(&self) {
        self.disposed.set(true);
    }
}

/// Capability discriminant, resolved once at spawn.
#[derive(Clone)]
pub enum ProcessKind {
    /// Background process without a window
    Service,
    /// Process that owns a window
    Windowed(Rc<dyn WindowedProcess>),
}

impl ProcessKind {
    /// Whether this is a windowed process.
    pub fn is_windowed(&self) -> bool {
        matches!(self, ProcessKind::Windowed(_))
    }
}

impl fmt::Debug for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessKind::Service => f.write_str("Service"),
            ProcessKind::Windowed(w) => write!(f, "Windowed({})", w.descriptor().id),
        }
    }
}

/// A row of the process table.
#[derive(Clone)]
pub struct ProcessEntry {
    /// The process itself
    pub process: Rc<dyn Process>,
    /// Windowed or not
    pub kind: ProcessKind,
}

impl ProcessEntry {
    /// Shortcut to the process bookkeeping.
    pub fn info(&self) -> &ProcessInfo {
        self.process.info()
    }

    /// The windowed capability, if any.
    pub fn windowed(&self) -> Option<&Rc<dyn WindowedProcess>> {
        match &self.kind {
            ProcessKind::Windowed(w) => Some(w),
            ProcessKind::Service => None,
        }
    }
}

impl fmt::Debug for ProcessEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessEntry")
            .field("info", self.info())
            .field("kind", &self.kind)
            .finish()
    }
}

/// The process table. Disposed processes stay in it.
pub type ProcessTable = BTreeMap<ProcessId, ProcessEntry>;

/// Result of a kill request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillOutcome {
    /// Unknown pid or already disposed
    NoSuchProcess,
    /// Critical process and the kill was not forced
    CriticalProcess,
    /// The process is now disposed
    Success,
}

impl KillOutcome {
    /// Whether the process was terminated.
    pub fn is_success(&self) -> bool {
        matches!(self, KillOutcome::Success)
    }
}
