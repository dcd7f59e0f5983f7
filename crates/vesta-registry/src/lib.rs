//! Vesta registry: a hierarchical, persisted configuration store.
//!
//! The registry is a single JSON tree split into four top-level hives:
//!
//! | Hive     | Contents                                   |
//! |----------|--------------------------------------------|
//! | `KERNEL` | kernel bookkeeping (pids, load times)      |
//! | `LOCAL`  | per-machine settings                       |
//! | `APPS`   | installed application metadata             |
//! | `USERS`  | user accounts                              |
//!
//! Entries are addressed by a hive plus a dot-path (`a.b.c`). The tree lives
//! in an [`Observable`](vesta_cell::Observable); a subscription on that cell
//! writes the whole tree through the storage adapter on every mutation.
//!
//! ```text
//! set_value(LOCAL, "a.b.c", 1)
//!        │
//!        ▼
//!   clone tree ─► insert at LOCAL.a.b.c ─► store.set(tree)
//!                                              │
//!                                              ▼
//!                                 write /System/Registry.json
//! ```
//!
//! Persistence is best effort: a failed write is logged and the in-memory
//! tree stays authoritative. A missing or corrupt blob is replaced by an
//! empty tree on load.

mod error;
mod hive;
mod store;
pub mod tree;

pub use error::RegistryError;
pub use hive::Hive;
pub use store::{now_millis, Registry, DEFAULT_REGISTRY_PATH};
