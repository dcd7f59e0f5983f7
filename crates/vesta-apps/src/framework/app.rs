//! App trait
//!
//! Defines the interface that all Vesta applications implement.

use async_trait::async_trait;

use super::error::AppError;
use super::process::AppProcess;

/// The interface every Vesta application implements.
///
/// # Lifecycle
///
/// 1. `start()` runs during spawn; an error rejects the spawn
/// 2. The surface is attached, then `render()` runs exactly once
/// 3. `on_close()` may veto a graceful close
/// 4. `stop()` runs when the process is killed
///
/// Every hook receives the hosting [`AppProcess`], which provides the title
/// cell, `safe` callback wrapping, and self-termination.
#[async_trait(?Send)]
pub trait App: 'static {
    /// Called once during spawn.
    async fn start(&self, _process: &AppProcess) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once the window surface exists.
    async fn render(&self, process: &AppProcess) -> Result<(), AppError>;

    /// Veto hook for graceful closes. `false` keeps the window open.
    fn on_close(&self, _process: &AppProcess) -> bool {
        true
    }

    /// Called when the process is killed.
    async fn stop(&self, _process: &AppProcess) -> Result<(), AppError> {
        Ok(())
    }
}
