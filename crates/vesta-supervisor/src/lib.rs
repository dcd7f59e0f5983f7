//! Vesta supervisor: runtime context, boot sequence and crash handling.
//!
//! The supervisor wires the lower crates into one running system:
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────┐
//!   │                        Runtime                        │
//!   │  config · registry · users · environment · logbook    │
//!   │                                                       │
//!   │  ProcessHandler ── init ── renderer ── apps, daemons  │
//!   │  SessionMachine ── boot ─► login ─► desktop           │
//!   │                       └──── crash ◄── guarded tasks   │
//!   └───────────┬───────────────────────────────┬───────────┘
//!               │ Document                      │ Stage
//!               ▼                               ▼
//!         app surfaces, dialogs          global state container
//! ```
//!
//! Hosts provide a [`Host`]: storage, a document, a stage, and the
//! [`LogBook`] layer they installed in their tracing subscriber.

pub mod config;
pub mod constants;
mod daemon;
mod environment;
mod error;
mod init;
mod logbook;
mod power;
mod runtime;
mod scripts;
mod users;

pub use config::{RuntimeConfig, Timings};
pub use daemon::UserDaemon;
pub use environment::Environment;
pub use error::{BootError, CrashReason, UserError};
pub use init::InitProcess;
pub use logbook::LogBook;
pub use power::PowerAction;
pub use runtime::{Host, Runtime, Scripts};
pub use scripts::register_builtin;
pub use users::{default_preferences, preferences_path, user_folder, UserLogic, UserRecord};
