//! Window manager for focus, z-order and window flags

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use vesta_cell::Observable;
use vesta_kernel::{ProcessId, Size, WindowFlags};

use crate::host::{Document, Geometry, SurfaceUpdate};

/// First z-index handed out. The counter only grows.
pub const BASE_Z_INDEX: u64 = 1_000_000;

/// Per-window state tracked by the manager
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowState {
    /// Current stacking order
    pub z_index: u64,
    /// Minimized
    pub minimized: bool,
    /// Maximized
    pub maximized: bool,
    /// Current placement (`None` for core surfaces)
    pub geometry: Option<Geometry>,
}

/// Window manager handling focus, z-order and minimize/maximize
pub struct WindowManager {
    /// Managed windows by owning process
    windows: RefCell<BTreeMap<ProcessId, WindowState>>,
    /// Next z-order value
    next_z: Cell<u64>,
    /// Focused window, if any
    focused: Observable<Option<ProcessId>>,
    /// Host receiving surface updates
    document: Rc<dyn Document>,
}

impl WindowManager {
    /// Create a new window manager
    pub fn new(document: Rc<dyn Document>) -> Self {
        Self {
            windows: RefCell::new(BTreeMap::new()),
            next_z: Cell::new(BASE_Z_INDEX),
            focused: Observable::new(None),
            document,
        }
    }

    fn take_z(&self) -> u64 {
        let z = self.next_z.get();
        self.next_z.set(z + 1);
        z
    }

    /// Start managing the window of `pid`, returning its z-index
    pub fn register(&self, pid: ProcessId, flags: WindowFlags, geometry: Option<Geometry>) -> u64 {
        let z_index = self.take_z();
        self.windows.borrow_mut().insert(
            pid,
            WindowState {
                z_index,
                minimized: flags.minimized,
                maximized: flags.maximized,
                geometry,
            },
        );
        z_index
    }

    /// Forget the window of `pid`
    pub fn unregister(&self, pid: ProcessId) {
        self.windows.borrow_mut().remove(&pid);
        if self.focused.get() == Some(pid) {
            self.focused.set(None);
        }
    }

    /// Get a window's state
    pub fn get(&self, pid: ProcessId) -> Option<WindowState> {
        self.windows.borrow().get(&pid).copied()
    }

    /// The focused-window cell
    pub fn focused(&self) -> &Observable<Option<ProcessId>> {
        &self.focused
    }

    /// Focus a window (restores and brings to top)
    pub fn focus(&self, pid: ProcessId) {
        let Some(state) = self.get(pid) else {
            return;
        };

        if state.minimized {
            self.set_minimized(pid, false);
        }
        if self.focused.get() == Some(pid) {
            return;
        }

        let z_index = self.take_z();
        if let Some(window) = self.windows.borrow_mut().get_mut(&pid) {
            window.z_index = z_index;
        }
        self.document
            .update_surface(pid, SurfaceUpdate::ZIndex(z_index));
        self.focused.set(Some(pid));
    }

    /// Minimize, or restore a minimized window
    pub fn toggle_minimize(&self, pid: ProcessId) {
        if let Some(state) = self.get(pid) {
            self.set_minimized(pid, !state.minimized);
        }
    }

    fn set_minimized(&self, pid: ProcessId, minimized: bool) {
        if let Some(window) = self.windows.borrow_mut().get_mut(&pid) {
            window.minimized = minimized;
        }
        self.document
            .update_surface(pid, SurfaceUpdate::Minimized(minimized));
        if minimized && self.focused.get() == Some(pid) {
            self.focused.set(None);
        }
    }

    /// Maximize, or restore a maximized window
    pub fn toggle_maximize(&self, pid: ProcessId) {
        let maximized = {
            let mut windows = self.windows.borrow_mut();
            let Some(window) = windows.get_mut(&pid) else {
                return;
            };
            window.maximized = !window.maximized;
            window.maximized
        };
        self.document
            .update_surface(pid, SurfaceUpdate::Maximized(maximized));
    }

    /// Center a window in the viewport. Core surfaces are left alone
    pub fn center(&self, pid: ProcessId) {
        let viewport = self.document.viewport();
        let centered = {
            let mut windows = self.windows.borrow_mut();
            let Some(window) = windows.get_mut(&pid) else {
                return;
            };
            let Some(current) = window.geometry else {
                return;
            };
            let size = Size::new(current.w, current.h);
            let centered = Geometry::centered(size, viewport);
            window.geometry = Some(centered);
            centered
        };
        self.document
            .update_surface(pid, SurfaceUpdate::Geometry(centered));
    }

    /// Managed pids, back to front
    pub fn stacking_order(&self) -> Vec<ProcessId> {
        let mut windows: Vec<(ProcessId, u64)> = self
            .windows
            .borrow()
            .iter()
            .map(|(pid, w)| (*pid, w.z_index))
            .collect();
        windows.sort_by_key(|(_, z)| *z);
        windows.into_iter().map(|(pid, _)| pid).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::HeadlessDocument;

    fn manager() -> (Rc<HeadlessDocument>, WindowManager) {
        let document = Rc::new(HeadlessDocument::new());
        let manager = WindowManager::new(document.clone());
        (document, manager)
    }

    fn geometry() -> Option<Geometry> {
        Some(Geometry {
            x: 0.0,
            y: 0.0,
            w: 200.0,
            h: 100.0,
        })
    }

    #[test]
    fn test_z_index_starts_high_and_grows() {
        let (_doc, wm) = manager();
        let a = wm.register(ProcessId(1), WindowFlags::default(), geometry());
        let b = wm.register(ProcessId(2), WindowFlags::default(), geometry());

        assert_eq!(a, BASE_Z_INDEX);
        assert!(b > a);

        wm.focus(ProcessId(1));
        assert!(wm.get(ProcessId(1)).unwrap().z_index > b);
        assert_eq!(wm.stacking_order(), vec![ProcessId(2), ProcessId(1)]);
    }

    #[test]
    fn test_focus_is_noop_when_already_focused() {
        let (doc, wm) = manager();
        wm.register(ProcessId(1), WindowFlags::default(), geometry());
        wm.focus(ProcessId(1));
        let z = wm.get(ProcessId(1)).unwrap().z_index;

        wm.focus(ProcessId(1));

        assert_eq!(wm.get(ProcessId(1)).unwrap().z_index, z);
        assert_eq!(wm.focused().get(), Some(ProcessId(1)));
        assert_eq!(
            doc.updates_for(ProcessId(1))
                .iter()
                .filter(|u| matches!(u, SurfaceUpdate::ZIndex(_)))
                .count(),
            1
        );
    }

    #[test]
    fn test_focus_restores_minimized_window() {
        let (_doc, wm) = manager();
        let flags = WindowFlags {
            minimized: true,
            ..WindowFlags::default()
        };
        wm.register(ProcessId(1), flags, geometry());

        wm.focus(ProcessId(1));

        assert!(!wm.get(ProcessId(1)).unwrap().minimized);
        assert_eq!(wm.focused().get(), Some(ProcessId(1)));
    }

    #[test]
    fn test_minimize_drops_focus() {
        let (_doc, wm) = manager();
        wm.register(ProcessId(1), WindowFlags::default(), geometry());
        wm.focus(ProcessId(1));

        wm.toggle_minimize(ProcessId(1));

        assert!(wm.get(ProcessId(1)).unwrap().minimized);
        assert_eq!(wm.focused().get(), None);
    }

    #[test]
    fn test_toggle_maximize() {
        let (doc, wm) = manager();
        wm.register(ProcessId(1), WindowFlags::default(), geometry());

        wm.toggle_maximize(ProcessId(1));
        assert!(wm.get(ProcessId(1)).unwrap().maximized);
        wm.toggle_maximize(ProcessId(1));
        assert!(!wm.get(ProcessId(1)).unwrap().maximized);

        assert_eq!(
            doc.updates_for(ProcessId(1)),
            vec![
                SurfaceUpdate::Maximized(true),
                SurfaceUpdate::Maximized(false)
            ]
        );
    }

    #[test]
    fn test_center() {
        let (doc, wm) = manager();
        doc.set_viewport(Size::new(1000.0, 600.0));
        wm.register(ProcessId(1), WindowFlags::default(), geometry());

        wm.center(ProcessId(1));

        assert_eq!(
            wm.get(ProcessId(1)).unwrap().geometry,
            Some(Geometry {
                x: 400.0,
                y: 250.0,
                w: 200.0,
                h: 100.0
            })
        );
    }

    #[test]
    fn test_unknown_pid_is_ignored() {
        let (doc, wm) = manager();
        wm.focus(ProcessId(9));
        wm.toggle_minimize(ProcessId(9));
        wm.center(ProcessId(9));
        assert!(doc.updates_for(ProcessId(9)).is_empty());
        assert_eq!(wm.focused().get(), None);
    }

    #[test]
    fn test_unregister_clears_focus() {
        let (_doc, wm) = manager();
        wm.register(ProcessId(1), WindowFlags::default(), geometry());
        wm.focus(ProcessId(1));

        wm.unregister(ProcessId(1));

        assert_eq!(wm.focused().get(), None);
        assert!(wm.get(ProcessId(1)).is_none());
    }
}
