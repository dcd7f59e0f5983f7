//! In-memory host document.
//!
//! Records every call so tests can assert on what the desktop asked the host
//! to do. Also used by the headless binary.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use vesta_kernel::{AppFiles, ProcessId, Size};

use crate::error::BundleError;
use crate::host::{Dialog, Document, SurfaceSpec, SurfaceUpdate};

/// Default viewport of a headless document.
pub const HEADLESS_VIEWPORT: Size = Size::new(1280.0, 800.0);

/// A [`Document`] that keeps everything in memory.
pub struct HeadlessDocument {
    render_target: Cell<bool>,
    viewport: Cell<Size>,
    surfaces: RefCell<BTreeMap<ProcessId, SurfaceSpec>>,
    closing: RefCell<BTreeSet<ProcessId>>,
    updates: RefCell<Vec<(ProcessId, SurfaceUpdate)>>,
    bundles: RefCell<BTreeSet<ProcessId>>,
    failing: RefCell<BTreeSet<String>>,
    dialogs: RefCell<Vec<Dialog>>,
    inserts: Cell<usize>,
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDocument {
    /// A document with a render target and a 1280x800 viewport.
    pub fn new() -> Self {
        Self {
            render_target: Cell::new(true),
            viewport: Cell::new(HEADLESS_VIEWPORT),
            surfaces: RefCell::new(BTreeMap::new()),
            closing: RefCell::new(BTreeSet::new()),
            updates: RefCell::new(Vec::new()),
            bundles: RefCell::new(BTreeSet::new()),
            failing: RefCell::new(BTreeSet::new()),
            dialogs: RefCell::new(Vec::new()),
            inserts: Cell::new(0),
        }
    }

    /// A document lacking any render target.
    pub fn without_render_target(self) -> Self {
        self.render_target.set(false);
        self
    }

    /// Change the viewport size.
    pub fn set_viewport(&self, viewport: Size) {
        self.viewport.set(viewport);
    }

    /// Make every bundle referencing `resource` fail to load.
    pub fn fail_resource(&self, resource: impl Into<String>) {
        self.failing.borrow_mut().insert(resource.into());
    }

    /// Pids with a surface, in pid order.
    pub fn surfaces(&self) -> Vec<ProcessId> {
        self.surfaces.borrow().keys().copied().collect()
    }

    /// Current state of a surface.
    pub fn surface(&self, pid: ProcessId) -> Option<SurfaceSpec> {
        self.surfaces.borrow().get(&pid).cloned()
    }

    /// Whether a surface for `pid` is in its closing state.
    pub fn is_closing(&self, pid: ProcessId) -> bool {
        self.closing.borrow().contains(&pid)
    }

    /// Total number of surfaces ever inserted.
    pub fn insert_count(&self) -> usize {
        self.inserts.get()
    }

    /// Updates applied to `pid`, oldest first.
    pub fn updates_for(&self, pid: ProcessId) -> Vec<SurfaceUpdate> {
        self.updates
            .borrow()
            .iter()
            .filter(|(p, _)| *p == pid)
            .map(|(_, u)| u.clone())
            .collect()
    }

    /// Dialogs shown so far.
    pub fn dialogs(&self) -> Vec<Dialog> {
        self.dialogs.borrow().clone()
    }

    /// Pids whose bundle is currently loaded.
    pub fn loaded_bundles(&self) -> Vec<ProcessId> {
        self.bundles.borrow().iter().copied().collect()
    }
}

#[async_trait(?Send)]
impl Document for HeadlessDocument {
    fn has_render_target(&self, target: &str) -> bool {
        self.render_target.get() && !target.is_empty()
    }

    fn viewport(&self) -> Size {
        self.viewport.get()
    }

    async fn load_bundle(&self, pid: ProcessId, files: &AppFiles) -> Result<String, BundleError> {
        tokio::task::yield_now().await;
        for resource in [&files.style, &files.markup] {
            if self.failing.borrow().contains(resource) {
                return Err(BundleError::new(resource.as_str(), "not found"));
            }
        }
        self.bundles.borrow_mut().insert(pid);
        tracing::debug!("[document] bundle loaded for pid {}: {}", pid, files.markup);
        Ok(format!("<section data-src=\"{}\"></section>", files.markup))
    }

    fn release_bundle(&self, pid: ProcessId) {
        self.bundles.borrow_mut().remove(&pid);
    }

    fn insert_surface(&self, surface: SurfaceSpec) {
        tracing::debug!(
            "[document] insert surface pid={} app={} z={}",
            surface.pid,
            surface.app_id,
            surface.z_index
        );
        self.inserts.set(self.inserts.get() + 1);
        self.surfaces.borrow_mut().insert(surface.pid, surface);
    }

    fn remove_surface(&self, pid: ProcessId) {
        if self.surfaces.borrow_mut().remove(&pid).is_some() {
            tracing::debug!("[document] remove surface pid={}", pid);
        }
        self.closing.borrow_mut().remove(&pid);
    }

    fn update_surface(&self, pid: ProcessId, update: SurfaceUpdate) {
        if let Some(surface) = self.surfaces.borrow_mut().get_mut(&pid) {
            match &update {
                SurfaceUpdate::ZIndex(z) => surface.z_index = *z,
                SurfaceUpdate::Minimized(m) => surface.flags.minimized = *m,
                SurfaceUpdate::Maximized(m) => surface.flags.maximized = *m,
                SurfaceUpdate::Title(t) => surface.title = t.clone(),
                SurfaceUpdate::Geometry(g) => surface.geometry = Some(*g),
                SurfaceUpdate::Closing => {
                    self.closing.borrow_mut().insert(pid);
                }
                SurfaceUpdate::Focused(_) => {}
            }
        }
        self.updates.borrow_mut().push((pid, update));
    }

    fn show_dialog(&self, dialog: Dialog) {
        tracing::info!("[document] dialog: {} - {}", dialog.title, dialog.message);
        self.dialogs.borrow_mut().push(dialog);
    }
}
