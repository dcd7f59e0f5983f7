//! Vesta storage adapter layer
//!
//! The runtime never touches the host filesystem directly. Everything that
//! persists (the registry blob, user preferences, user folders) goes through
//! a [`StorageAdapter`]:
//!
//! - **Core**: path normalization, listing types, [`VfsError`]
//! - **Service**: the [`StorageAdapter`] trait
//! - **Disk**: [`DiskVfs`], rooted in a host directory
//! - **Testing**: [`MemoryVfs`], a non-persistent adapter for tests and headless runs
//!
//! # Paths
//!
//! Paths are Unix-like. Both absolute (`/System/Registry.json`) and
//! root-relative (`./System/Registry.json`, `System/Registry.json`) forms are
//! accepted and normalized to the absolute form before use.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  Registry / UserLogic / ...  │
//! └──────────────┬───────────────┘
//!                │ StorageAdapter
//!       ┌────────┴────────┐
//!       ▼                 ▼
//!   DiskVfs           MemoryVfs
//!  (<data>/vesta)     (BTreeMap)
//! ```

pub mod core;
pub mod disk;
pub mod service;
pub mod testing;

pub use core::{filename, join_path, normalize_path, parent_path, validate_path};
pub use core::{DirEntry, DirListing, VfsError};
pub use disk::DiskVfs;
pub use service::StorageAdapter;
pub use testing::MemoryVfs;
