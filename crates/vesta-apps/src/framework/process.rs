//! The windowed process hosting an [`App`].

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use vesta_cell::Observable;
use vesta_kernel::{
    panic_message, AppDescriptor, KillOutcome, Process, ProcessError, ProcessHandler, ProcessId,
    ProcessInfo, SurfaceSync, WindowedProcess,
};

use super::app::App;
use super::error::AppError;

/// Timing knobs for windowed processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppTimings {
    /// Closing animation length before self-termination
    pub close_grace: Duration,
    /// Crash detection poll interval
    pub crash_poll: Duration,
}

impl Default for AppTimings {
    fn default() -> Self {
        Self {
            close_grace: Duration::from_millis(300),
            crash_poll: Duration::from_millis(1),
        }
    }
}

/// A process that owns a window and hosts an [`App`].
pub struct AppProcess {
    /// Kernel bookkeeping (name = app id)
    info: ProcessInfo,
    /// Private copy of the catalog descriptor
    descriptor: AppDescriptor,
    /// Launch arguments
    args: Value,
    /// Set once a wrapped callback fails
    crash_reason: RefCell<Option<String>>,
    /// Titlebar text
    title: Observable<String>,
    /// Lifecycle manager, for self-termination and surface queries
    handler: Weak<ProcessHandler>,
    /// Self reference handed to wrapped callbacks
    me: Weak<AppProcess>,
    /// The hosted application
    app: Box<dyn App>,
    timings: AppTimings,
}

impl fmt::Debug for AppProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppProcess")
            .field("info", &self.info)
            .field("app", &self.descriptor.id)
            .finish_non_exhaustive()
    }
}

impl AppProcess {
    /// Build the process around `app`.
    ///
    /// Fails when a non-core descriptor has no valid position.
    pub fn new(
        info: ProcessInfo,
        descriptor: &AppDescriptor,
        args: Value,
        app: Box<dyn App>,
        handler: &Rc<ProcessHandler>,
        timings: AppTimings,
    ) -> Result<Rc<Self>, ProcessError> {
        if !descriptor.core {
            descriptor
                .position
                .placement()
                .map_err(|e| ProcessError::Load(format!("{}: {}", descriptor.id, e)))?;
        }

        let title = Observable::new(descriptor.metadata.name.clone());
        Ok(Rc::new_cyclic(|me| Self {
            info,
            descriptor: descriptor.clone(),
            args,
            crash_reason: RefCell::new(None),
            title,
            handler: Rc::downgrade(handler),
            me: me.clone(),
            app,
            timings,
        }))
    }

    /// This process's pid.
    pub fn pid(&self) -> ProcessId {
        self.info.pid
    }

    /// The application id.
    pub fn app_id(&self) -> &str {
        &self.descriptor.id
    }

    /// Launch arguments passed to `spawn_app`.
    pub fn args(&self) -> &Value {
        &self.args
    }

    /// Recorded crash reason, if any.
    pub fn crash_reason(&self) -> Option<String> {
        self.crash_reason.borrow().clone()
    }

    /// Record a crash; crash detection picks it up on its next tick.
    pub fn crash(&self, reason: impl Into<String>) {
        let mut reason = reason.into();
        if reason.is_empty() {
            reason = String::from("unknown error");
        }
        tracing::error!(
            "[app {} PID={}] crashed: {}",
            self.descriptor.id,
            self.info.pid,
            reason
        );
        self.crash_reason.borrow_mut().get_or_insert(reason);
    }

    fn surfaces(&self) -> Option<Rc<dyn SurfaceSync>> {
        self.handler.upgrade()?.surfaces()
    }

    // ========================================================================
    // Failure containment
    // ========================================================================

    /// Wrap a callback so its failures become this process's crash reason.
    ///
    /// The wrapper does nothing once the process is disposed. Errors and
    /// panics inside `callback` are swallowed and recorded.
    pub fn safe<A, F>(&self, callback: F) -> impl Fn(A) + 'static
    where
        A: 'static,
        F: Fn(A) -> Result<(), AppError> + 'static,
    {
        let me = self.me.clone();
        move |arg: A| {
            let Some(process) = me.upgrade() else {
                return;
            };
            if process.info.is_disposed() {
                return;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| callback(arg))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => process.crash(e.to_string()),
                Err(payload) => process.crash(panic_message(payload.as_ref())),
            }
        }
    }

    /// Run async work on the local task set, recording its failure.
    pub fn spawn_safe<Fut>(&self, work: Fut)
    where
        Fut: Future<Output = Result<(), AppError>> + 'static,
    {
        let me = self.me.clone();
        let task = tokio::task::spawn_local(work);
        tokio::task::spawn_local(async move {
            let failure = match task.await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => e.to_string(),
                Err(join) if join.is_panic() => panic_message(join.into_panic().as_ref()),
                Err(join) => join.to_string(),
            };
            if let Some(process) = me.upgrade() {
                if !process.info.is_disposed() {
                    process.crash(failure);
                }
            }
        });
    }

    // ========================================================================
    // Termination
    // ========================================================================

    /// Kill this process immediately: no veto, no animation.
    pub async fn kill_self(&self) -> KillOutcome {
        match self.handler.upgrade() {
            Some(handler) => handler.kill(self.info.pid, false).await,
            None => KillOutcome::NoSuchProcess,
        }
    }

    /// Whether this is the oldest rendered live instance of its app.
    pub fn get_single_instance_lock(&self) -> bool {
        let Some(surfaces) = self.surfaces() else {
            return true;
        };
        surfaces
            .app_instances(&self.descriptor.id, Some(self.info.pid))
            .into_iter()
            .all(|other| other > self.info.pid)
    }

    /// Kill this process if an older instance holds the lock.
    ///
    /// Returns true when the process closed itself.
    pub async fn close_if_second_instance(&self) -> bool {
        if self.get_single_instance_lock() {
            return false;
        }
        tracing::info!(
            "[app {} PID={}] another instance is running, closing",
            self.descriptor.id,
            self.info.pid
        );
        self.kill_self().await;
        true
    }
}

#[async_trait(?Send)]
impl Process for AppProcess {
    fn info(&self) -> &ProcessInfo {
        &self.info
    }

    async fn start(&self) -> Result<(), ProcessError> {
        self.app.start(self).await.map_err(ProcessError::from)
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        self.app.stop(self).await.map_err(ProcessError::from)
    }

    fn windowed(self: Rc<Self>) -> Option<Rc<dyn WindowedProcess>> {
        Some(self)
    }
}

#[async_trait(?Send)]
impl WindowedProcess for AppProcess {
    fn descriptor(&self) -> &AppDescriptor {
        &self.descriptor
    }

    fn title(&self) -> &Observable<String> {
        &self.title
    }

    async fn render(&self) -> Result<(), ProcessError> {
        self.app.render(self).await.map_err(ProcessError::from)
    }

    async fn crash_detection(&self) -> ProcessError {
        loop {
            if let Some(reason) = self.crash_reason() {
                return ProcessError::Runtime(reason);
            }
            if self.info.is_disposed() {
                return ProcessError::Disposed;
            }
            tokio::time::sleep(self.timings.crash_poll).await;
        }
    }

    async fn close_window(&self) {
        if self.info.is_disposed() {
            return;
        }
        if !self.app.on_close(self) {
            tracing::info!(
                "[app {} PID={}] close vetoed",
                self.descriptor.id,
                self.info.pid
            );
            return;
        }

        let has_surface = self
            .surfaces()
            .is_some_and(|surfaces| surfaces.mark_closing(self.info.pid));
        if has_surface {
            tokio::time::sleep(self.timings.close_grace).await;
        }
        self.kill_self().await;
    }
}
