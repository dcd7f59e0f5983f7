//! Vesta applications
//!
//! Windowed applications are black boxes implementing [`App`]. The framework
//! wraps each one in an [`AppProcess`], the windowed process the kernel and
//! the surface synchronizer deal with, and the [`AppCatalog`] keeps the
//! statically registered applications that can be spawned by id.
//!
//! ```text
//!   AppCatalog::load_app(descriptor, factory)      validate, store, APPS.<id>
//!              │
//!              ▼
//!   AppCatalog::spawn_app(handler, id, parent)     deep copy of the descriptor
//!              │
//!              ▼
//!   ProcessHandler::spawn ──► AppProcess { App }   Windowed kind
//!              │
//!              ▼
//!   surface synchronizer: render() ∥ crash_detection()
//! ```

pub mod catalog;
pub mod framework;

pub use catalog::{AppCatalog, AppFactory};
pub use framework::{App, AppError, AppProcess, AppTimings};
