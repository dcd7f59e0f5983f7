//! Directory listing types.

use serde::{Deserialize, Serialize};

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not the full path)
    pub name: String,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Creation time (milliseconds since epoch)
    pub created_at: u64,
    /// Last modification time (milliseconds since epoch)
    pub modified_at: u64,
}

/// Contents of a directory, split by kind and sorted by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirListing {
    /// Subdirectories
    pub dirs: Vec<DirEntry>,
    /// Regular files
    pub files: Vec<DirEntry>,
}

impl DirListing {
    /// Whether a subdirectory named `name` is listed.
    pub fn has_dir(&self, name: &str) -> bool {
        self.dirs.iter().any(|d| d.name == name)
    }

    /// Whether a file named `name` is listed.
    pub fn has_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }
}
