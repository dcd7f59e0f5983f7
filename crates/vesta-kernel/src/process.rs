//! The process contract.

use std::rc::Rc;

use async_trait::async_trait;
use vesta_cell::Observable;

use crate::descriptor::AppDescriptor;
use crate::error::ProcessError;
use crate::types::ProcessInfo;

/// A logical process managed by the [`ProcessHandler`](crate::ProcessHandler).
///
/// # Lifecycle
///
/// 1. The handler allocates a pid and builds the process
/// 2. `start()` runs; an `Err` aborts the spawn and the process is dropped
/// 3. The process runs until `kill`, which calls `stop()` then disposes it
#[async_trait(?Send)]
pub trait Process: 'static {
    /// Bookkeeping assigned at spawn.
    fn info(&self) -> &ProcessInfo;

    /// Start hook. Returning `Err` rejects the spawn.
    async fn start(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Stop hook, run by `kill` before the cascade. Errors are logged only.
    async fn stop(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    /// The windowed capability of this process, if it owns a window.
    ///
    /// Consulted once at spawn time.
    fn windowed(self: Rc<Self>) -> Option<Rc<dyn WindowedProcess>> {
        None
    }
}

/// A process that owns a window surface.
#[async_trait(?Send)]
pub trait WindowedProcess: Process {
    /// Immutable copy of the application descriptor taken at construction.
    fn descriptor(&self) -> &AppDescriptor;

    /// Titlebar text.
    fn title(&self) -> &Observable<String>;

    /// Render hook, called once after the surface is attached.
    async fn render(&self) -> Result<(), ProcessError>;

    /// Resolves with the failure once the process crashes or is disposed.
    async fn crash_detection(&self) -> ProcessError;

    /// Graceful close: veto check, closing animation, then self-termination.
    async fn close_window(&self);
}
