//! Test doubles for the process table.
//!
//! Used by this crate's tests and by the crates layered on top of it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use vesta_registry::{Registry, DEFAULT_REGISTRY_PATH};
use vesta_vfs::MemoryVfs;

use crate::error::ProcessError;
use crate::process::Process;
use crate::types::ProcessInfo;

/// A registry over a fresh in-memory store.
pub fn test_registry() -> Rc<Registry> {
    Rc::new(Registry::open(
        Rc::new(MemoryVfs::new()),
        DEFAULT_REGISTRY_PATH,
    ))
}

/// Shared, ordered record of lifecycle events.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    /// Append an event.
    pub fn push(&self, event: impl Into<String>) {
        self.0.borrow_mut().push(event.into());
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Whether `event` was recorded.
    pub fn contains(&self, event: &str) -> bool {
        self.0.borrow().iter().any(|e| e == event)
    }
}

/// A background process whose hooks can be told to fail.
///
/// Records `<name>:stop` in its [`EventLog`] when stopped.
pub struct ScriptedProcess {
    info: ProcessInfo,
    log: EventLog,
    refuse_start: Cell<bool>,
    fail_stop: Cell<bool>,
}

impl ScriptedProcess {
    /// Create a process that starts and stops cleanly.
    pub fn new(info: ProcessInfo, log: &EventLog) -> Rc<Self> {
        Rc::new(Self {
            info,
            log: log.clone(),
            refuse_start: Cell::new(false),
            fail_stop: Cell::new(false),
        })
    }

    /// Make `start()` fail.
    pub fn refusing_start(self: Rc<Self>) -> Rc<Self> {
        self.refuse_start.set(true);
        self
    }

    /// Make `stop()` fail.
    pub fn failing_stop(self: Rc<Self>) -> Rc<Self> {
        self.fail_stop.set(true);
        self
    }
}

#[async_trait(?Send)]
impl Process for ScriptedProcess {
    fn info(&self) -> &ProcessInfo {
        &self.info
    }

    async fn start(&self) -> Result<(), ProcessError> {
        if self.refuse_start.get() {
            return Err(ProcessError::failed("start refused"));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        self.log.push(format!("{}:stop", self.info.name));
        if self.fail_stop.get() {
            return Err(ProcessError::failed("stop failed"));
        }
        Ok(())
    }
}
