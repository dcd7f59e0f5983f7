//! The surface synchronizer.
//!
//! The renderer keeps the set of window surfaces equal to the set of live
//! windowed processes and supervises each of them:
//!
//! ```text
//!   sync()
//!     ├─ sync_newbies ── record pid ──► supervise (local task)
//!     │                                   ├─ geometry, bundle, settle
//!     │                                   ├─ insert surface, wire cells
//!     │                                   ├─ race render task / crash_detection()
//!     │                                   ├─ focus, keep watching crashes
//!     │                                   └─ failure: dialog, yield, kill
//!     └─ sync_disposed ── remove surface, release bundle, drop record
//! ```
//!
//! Failures of one process end in a dialog and the termination of that
//! process only.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinError;
use vesta_cell::SubscriptionId;
use vesta_kernel::{
    panic_message, Process, ProcessError, ProcessHandler, ProcessId, ProcessInfo, SpawnError,
    SurfaceSync, WindowedProcess,
};

use crate::error::RendererError;
use crate::geometry::initial_geometry;
use crate::host::{Dialog, Document, SurfaceSpec, SurfaceUpdate};
use crate::manager::WindowManager;

/// Name of the renderer process.
pub const RENDERER_NAME: &str = "renderer";

/// Renderer settings.
#[derive(Clone, Debug, PartialEq)]
pub struct RendererConfig {
    /// Host element surfaces are rendered into
    pub target: String,
    /// Wait after loading a bundle so its stylesheet applies before insertion
    pub style_settle: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            target: String::from("desktop"),
            style_settle: Duration::from_millis(100),
        }
    }
}

/// A surface known to the renderer.
struct RenderedSurface {
    app_id: String,
    process: Rc<dyn WindowedProcess>,
    /// Surface inserted into the document
    mounted: bool,
    focus_sub: Option<SubscriptionId>,
    title_sub: Option<SubscriptionId>,
}

/// Surface synchronizer and window supervisor. Itself a critical process.
pub struct Renderer {
    info: ProcessInfo,
    handler: Weak<ProcessHandler>,
    document: Rc<dyn Document>,
    windows: WindowManager,
    /// Every pid a render was started for, recorded before the render runs
    rendered: RefCell<BTreeMap<ProcessId, RenderedSurface>>,
    style_settle: Duration,
    me: Weak<Renderer>,
}

impl Renderer {
    /// Build the renderer. Fails when the document lacks the render target.
    pub fn new(
        info: ProcessInfo,
        handler: &Rc<ProcessHandler>,
        document: Rc<dyn Document>,
        config: &RendererConfig,
    ) -> Result<Rc<Self>, ProcessError> {
        if !document.has_render_target(&config.target) {
            let err = RendererError::MissingRenderTarget(config.target.clone());
            return Err(ProcessError::Load(err.to_string()));
        }

        Ok(Rc::new_cyclic(|me| Self {
            info,
            handler: Rc::downgrade(handler),
            windows: WindowManager::new(Rc::clone(&document)),
            document,
            rendered: RefCell::new(BTreeMap::new()),
            style_settle: config.style_settle,
            me: me.clone(),
        }))
    }

    /// Spawn a critical renderer under `parent` and attach it to `handler`.
    ///
    /// Must run inside a `LocalSet`: every render is a local task.
    pub async fn launch(
        handler: &Rc<ProcessHandler>,
        parent: Option<ProcessId>,
        document: Rc<dyn Document>,
        config: &RendererConfig,
    ) -> Result<Rc<Self>, SpawnError> {
        let renderer = handler
            .spawn(RENDERER_NAME, parent, |info| {
                Self::new(info.critical(), handler, document, config)
            })
            .await?;
        let surfaces: Rc<dyn SurfaceSync> = renderer.clone();
        handler.attach_surfaces(&surfaces);
        Ok(renderer)
    }

    /// The window manager.
    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    /// The host document.
    pub fn document(&self) -> &Rc<dyn Document> {
        &self.document
    }

    /// Pids currently in the rendered record.
    pub fn rendered_pids(&self) -> Vec<ProcessId> {
        self.rendered.borrow().keys().copied().collect()
    }

    /// Whether a render was started for `pid` and not yet cleaned up.
    pub fn is_rendered(&self, pid: ProcessId) -> bool {
        self.rendered.borrow().contains_key(&pid)
    }

    /// Whether `pid` has a surface in the document.
    pub fn is_mounted(&self, pid: ProcessId) -> bool {
        self.rendered.borrow().get(&pid).is_some_and(|r| r.mounted)
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Reconcile surfaces with the process table: newcomers, then leavers.
    pub fn try_sync(&self) -> Result<(), RendererError> {
        if self.info.is_disposed() {
            return Err(RendererError::Disposed);
        }
        self.sync_newbies();
        self.sync_disposed();
        Ok(())
    }

    fn sync_newbies(&self) {
        let (Some(handler), Some(me)) = (self.handler.upgrade(), self.me.upgrade()) else {
            return;
        };

        let newbies: Vec<Rc<dyn WindowedProcess>> = handler
            .windowed_entries()
            .into_iter()
            .filter_map(|entry| entry.windowed().cloned())
            .filter(|process| !self.is_rendered(process.info().pid))
            .collect();

        for process in newbies {
            let pid = process.info().pid;
            self.rendered.borrow_mut().insert(
                pid,
                RenderedSurface {
                    app_id: process.descriptor().id.clone(),
                    process: Rc::clone(&process),
                    mounted: false,
                    focus_sub: None,
                    title_sub: None,
                },
            );
            tracing::debug!("[renderer] rendering {} PID={}", process.descriptor().id, pid);
            tokio::task::spawn_local(Rc::clone(&me).supervise(process));
        }
    }

    fn sync_disposed(&self) {
        let Some(handler) = self.handler.upgrade() else {
            return;
        };

        let gone: Vec<ProcessId> = self
            .rendered
            .borrow()
            .keys()
            .copied()
            .filter(|pid| handler.get_process(*pid).is_none())
            .collect();

        for pid in gone {
            let Some(record) = self.rendered.borrow_mut().remove(&pid) else {
                continue;
            };
            if let Some(id) = record.focus_sub {
                self.windows.focused().unsubscribe(id);
            }
            if let Some(id) = record.title_sub {
                record.process.title().unsubscribe(id);
            }
            self.windows.unregister(pid);
            self.document.remove_surface(pid);
            self.document.release_bundle(pid);
            tracing::debug!("[renderer] removed {} PID={}", record.app_id, pid);
        }
    }

    // ========================================================================
    // Supervision
    // ========================================================================

    async fn supervise(self: Rc<Self>, process: Rc<dyn WindowedProcess>) {
        let pid = process.info().pid;

        let failure = match self.mount(&process).await {
            Err(e) => e,
            Ok(()) => {
                let mut render = {
                    let process = Rc::clone(&process);
                    tokio::task::spawn_local(async move { process.render().await })
                };
                let outcome = tokio::select! {
                    joined = &mut render => rendered(joined),
                    failure = process.crash_detection() => Err(failure),
                };
                render.abort();
                match outcome {
                    Ok(()) => {
                        self.windows.focus(pid);
                        RendererError::from(process.crash_detection().await)
                    }
                    Err(e) => RendererError::from(e),
                }
            }
        };

        self.handle_failure(&process, failure).await;
    }

    /// Geometry, bundle, settle delay, surface insertion and cell wiring.
    async fn mount(&self, process: &Rc<dyn WindowedProcess>) -> Result<(), RendererError> {
        let pid = process.info().pid;
        let descriptor = process.descriptor();

        let geometry = initial_geometry(descriptor, self.document.viewport())?;
        let markup = self.document.load_bundle(pid, &descriptor.files).await?;
        tokio::time::sleep(self.style_settle).await;

        if process.info().is_disposed() || !self.is_rendered(pid) {
            self.document.release_bundle(pid);
            return Err(ProcessError::Disposed.into());
        }

        let z_index = self.windows.register(pid, descriptor.state, geometry);
        self.document.insert_surface(SurfaceSpec {
            pid,
            app_id: descriptor.id.clone(),
            title: process.title().get(),
            markup,
            geometry,
            flags: descriptor.state,
            controls: descriptor.controls,
            z_index,
        });

        let document = Rc::clone(&self.document);
        let focus_sub = self.windows.focused().subscribe(move |focused| {
            document.update_surface(pid, SurfaceUpdate::Focused(*focused == Some(pid)));
        });
        let document = Rc::clone(&self.document);
        let title_sub = process.title().subscribe(move |title: &String| {
            document.update_surface(pid, SurfaceUpdate::Title(title.clone()));
        });

        if let Some(record) = self.rendered.borrow_mut().get_mut(&pid) {
            record.mounted = true;
            record.focus_sub = Some(focus_sub);
            record.title_sub = Some(title_sub);
        }
        Ok(())
    }

    async fn handle_failure(&self, process: &Rc<dyn WindowedProcess>, failure: RendererError) {
        let pid = process.info().pid;
        let descriptor = process.descriptor();

        if failure.is_process_disposed() || process.info().is_disposed() {
            tracing::debug!("[renderer] {} PID={} ended", descriptor.id, pid);
            return;
        }

        tracing::error!(
            "[renderer] {} PID={} failed: {}",
            descriptor.id,
            pid,
            failure
        );
        let name = &descriptor.metadata.name;
        self.document.show_dialog(Dialog::error(
            format!("{} - Application Error", name),
            format!(
                "{} ({}, PID {}) has stopped working.\n\n{}",
                name, descriptor.id, pid, failure
            ),
        ));

        tokio::task::yield_now().await;
        if let Some(handler) = self.handler.upgrade() {
            handler.kill(pid, false).await;
        }
    }
}

/// Outcome of the render task; a panic counts as a runtime failure.
fn rendered(joined: Result<Result<(), ProcessError>, JoinError>) -> Result<(), ProcessError> {
    match joined {
        Ok(outcome) => outcome,
        Err(join) if join.is_panic() => Err(ProcessError::Runtime(panic_message(
            join.into_panic().as_ref(),
        ))),
        Err(join) => Err(ProcessError::Runtime(join.to_string())),
    }
}

impl SurfaceSync for Renderer {
    fn sync(&self) {
        if let Err(e) = self.try_sync() {
            tracing::debug!("[renderer] sync skipped: {}", e);
        }
    }

    fn app_instances(&self, app_id: &str, origin: Option<ProcessId>) -> Vec<ProcessId> {
        let Some(handler) = self.handler.upgrade() else {
            return Vec::new();
        };
        self.rendered
            .borrow()
            .iter()
            .filter(|(pid, record)| {
                record.app_id == app_id && Some(**pid) != origin && handler.is_pid(**pid)
            })
            .map(|(pid, _)| *pid)
            .collect()
    }

    fn mark_closing(&self, pid: ProcessId) -> bool {
        let mounted = self.is_mounted(pid);
        if mounted {
            self.document.update_surface(pid, SurfaceUpdate::Closing);
        }
        mounted
    }
}

#[async_trait(?Send)]
impl Process for Renderer {
    fn info(&self) -> &ProcessInfo {
        &self.info
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        tracing::info!("[renderer] stopping with {} surfaces", self.rendered.borrow().len());
        Ok(())
    }
}
