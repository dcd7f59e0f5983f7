//! Vesta kernel: process table and lifecycle manager.
//!
//! Every logical activity in the runtime (the init process, the surface
//! synchronizer, each application window) is a [`Process`] registered in the
//! [`ProcessHandler`]'s table under a unique, monotonically allocated
//! [`ProcessId`].
//!
//! # Process lifecycle
//!
//! ```text
//!   spawn(name, parent, build)
//!        │
//!        ▼
//!   ┌──────────┐  start() = Err  ┌───────────────┐
//!   │ spawned  │────────────────►│ never inserted│
//!   └────┬─────┘                 └───────────────┘
//!        │ start() = Ok
//!        ▼
//!   ┌──────────┐  kill(pid)       ┌──────────┐
//!   │ running  │─────────────────►│ disposed │  (terminal, stays in table)
//!   └──────────┘  stop, cascade   └──────────┘
//! ```
//!
//! Killing a process cascades depth-first to its children. Windowed children
//! are asked to close gracefully (and may veto); other children are killed.
//! Critical processes refuse termination unless forced.
//!
//! # Kinds
//!
//! Whether a process owns a window is resolved once at spawn time through
//! [`Process::windowed`] and stored in the table entry as a [`ProcessKind`].
//!
//! # Single-threaded model
//!
//! Everything here is `!Send`: processes are `Rc`s driven by one cooperative
//! event loop. Async hooks use `async_trait(?Send)`.

use std::future::Future;
use std::pin::Pin;

pub mod descriptor;
mod error;
mod handler;
pub mod invariants;
mod process;
mod surfaces;
pub mod testing;
mod types;

pub use descriptor::{
    AppDescriptor, AppFiles, AppMetadata, Placement, Position, Size, WindowControls, WindowFlags,
};
pub use error::{panic_message, DescriptorError, ProcessError, SpawnError};
pub use handler::ProcessHandler;
pub use invariants::{check_all_invariants, InvariantViolation};
pub use process::{Process, WindowedProcess};
pub use surfaces::SurfaceSync;
pub use types::{KillOutcome, ProcessEntry, ProcessId, ProcessInfo, ProcessKind, ProcessTable};

/// A boxed, non-`Send` future.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;
