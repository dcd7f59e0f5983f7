//! Vesta desktop: surface synchronizer and window management.
//!
//! The [`Renderer`] is attached to the kernel's process handler as its
//! [`SurfaceSync`](vesta_kernel::SurfaceSync). After every table mutation it
//! diffs the live windowed processes against the surfaces it has rendered:
//!
//! ```text
//!   ProcessHandler ──spawn/kill──► sync()
//!                                    │
//!            ┌───────────────────────┴──────────────────────┐
//!            ▼                                              ▼
//!    live, not yet rendered                       rendered, no longer live
//!    (record, then render)                        (remove surface, release)
//!            │
//!            ▼
//!    ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//!    │   Document   │◄──│ WindowManager │◄──│   Renderer   │
//!    │ (host trait) │   │ focus/z-order │   │ supervision  │
//!    └──────────────┘   └───────────────┘   └──────────────┘
//! ```
//!
//! The host side is abstracted behind [`Document`]; [`testing::HeadlessDocument`]
//! keeps everything in memory.

mod error;
mod geometry;
mod host;
mod manager;
mod renderer;
pub mod testing;

pub use error::{BundleError, RendererError};
pub use geometry::initial_geometry;
pub use host::{Dialog, DialogKind, Document, Geometry, SurfaceSpec, SurfaceUpdate};
pub use manager::{WindowManager, WindowState, BASE_Z_INDEX};
pub use renderer::{Renderer, RendererConfig, RENDERER_NAME};
