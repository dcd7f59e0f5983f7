//! Core types shared by every storage adapter.

mod error;
mod path;
mod types;

pub use error::VfsError;
pub use path::{filename, join_path, normalize_path, parent_path, validate_path};
pub use types::{DirEntry, DirListing};
