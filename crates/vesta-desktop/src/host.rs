//! The host document contract.
//!
//! The renderer never touches presentation directly. It describes surfaces
//! and their changes to a [`Document`], which owns the actual elements,
//! stylesheets and dialogs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vesta_kernel::{AppFiles, ProcessId, Size, WindowControls, WindowFlags};

use crate::error::BundleError;

/// Placement of a window surface in viewport pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Geometry {
    /// A `size` box centered in `viewport`.
    pub fn centered(size: Size, viewport: Size) -> Self {
        Self {
            x: (viewport.w - size.w) / 2.0,
            y: (viewport.h - size.h) / 2.0,
            w: size.w,
            h: size.h,
        }
    }
}

/// Everything the host needs to create a window surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSpec {
    /// Owning process
    pub pid: ProcessId,
    /// Application id
    pub app_id: String,
    /// Initial titlebar text
    pub title: String,
    /// Loaded markup
    pub markup: String,
    /// `None` for core (fullscreen) surfaces
    pub geometry: Option<Geometry>,
    /// Initial flags
    pub flags: WindowFlags,
    /// Titlebar buttons
    pub controls: WindowControls,
    /// Stacking order
    pub z_index: u64,
}

/// A change to an existing surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SurfaceUpdate {
    /// Focus highlight on or off
    Focused(bool),
    /// New stacking order
    ZIndex(u64),
    /// Minimized state
    Minimized(bool),
    /// Maximized state
    Maximized(bool),
    /// Closing animation started
    Closing,
    /// Titlebar text
    Title(String),
    /// Moved or resized
    Geometry(Geometry),
}

/// Severity of a message box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogKind {
    /// Informational
    Info,
    /// Something was not possible
    Warning,
    /// Something failed
    Error,
}

/// A modal message box.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Window title
    pub title: String,
    /// Body text
    pub message: String,
    /// Severity
    pub kind: DialogKind,
}

impl Dialog {
    /// Informational message box.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, DialogKind::Info)
    }

    /// Warning message box.
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, DialogKind::Warning)
    }

    /// Error message box.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, DialogKind::Error)
    }

    fn new(title: impl Into<String>, message: impl Into<String>, kind: DialogKind) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
        }
    }
}

/// The host document the desktop renders into.
#[async_trait(?Send)]
pub trait Document {
    /// Whether the element named `target` exists.
    fn has_render_target(&self, target: &str) -> bool;

    /// Current viewport size.
    fn viewport(&self) -> Size;

    /// Load the stylesheet and markup for `pid`, returning the markup.
    async fn load_bundle(&self, pid: ProcessId, files: &AppFiles) -> Result<String, BundleError>;

    /// Drop whatever `load_bundle` attached for `pid`. Idempotent.
    fn release_bundle(&self, pid: ProcessId);

    /// Create a surface.
    fn insert_surface(&self, surface: SurfaceSpec);

    /// Remove a surface. Idempotent.
    fn remove_surface(&self, pid: ProcessId);

    /// Apply a change to an existing surface.
    fn update_surface(&self, pid: ProcessId, update: SurfaceUpdate);

    /// Show a message box.
    fn show_dialog(&self, dialog: Dialog);
}
