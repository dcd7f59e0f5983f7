//! Storage adapter backed by a host directory.
//!
//! Virtual paths map one-to-one onto paths under the root directory:
//! `/System/Registry.json` lives at `<root>/System/Registry.json`.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fs_err as fs;

use crate::core::{normalize_path, DirEntry, DirListing, VfsError};
use crate::service::StorageAdapter;

/// Directory name used under the platform data directory.
pub const DEFAULT_ROOT_NAME: &str = "vesta";

/// Host-directory storage adapter.
#[derive(Clone, Debug)]
pub struct DiskVfs {
    root: PathBuf,
}

impl DiskVfs {
    /// Root the adapter at `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, VfsError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root the adapter at `<data-local-dir>/vesta`.
    pub fn in_data_dir() -> Result<Self, VfsError> {
        let base = dirs::data_local_dir()
            .ok_or_else(|| VfsError::Unavailable(String::from("no local data directory")))?;
        Self::new(base.join(DEFAULT_ROOT_NAME))
    }

    /// The host directory backing `/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, VfsError> {
        let normalized = normalize_path(path)?;
        Ok(normalized
            .split('/')
            .filter(|c| !c.is_empty())
            .fold(self.root.clone(), |acc, c| acc.join(c)))
    }
}

fn millis(time: std::io::Result<SystemTime>) -> u64 {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl StorageAdapter for DiskVfs {
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), VfsError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
        Ok(())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Err(VfsError::NotAFile(normalize_path(path)?));
        }
        Ok(fs::read(&target)?)
    }

    fn create_directory(&self, path: &str) -> Result<(), VfsError> {
        let target = self.resolve(path)?;
        fs::create_dir_all(&target)?;
        Ok(())
    }

    fn read_directory(&self, path: &str) -> Result<DirListing, VfsError> {
        let target = self.resolve(path)?;
        if target.is_file() {
            return Err(VfsError::NotADirectory(normalize_path(path)?));
        }

        let mut listing = DirListing::default();
        for entry in fs::read_dir(&target)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            let item = DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: if meta.is_file() { meta.len() } else { 0 },
                created_at: millis(meta.created()),
                modified_at: millis(meta.modified()),
            };
            if meta.is_dir() {
                listing.dirs.push(item);
            } else {
                listing.files.push(item);
            }
        }
        listing.dirs.sort_by(|a, b| a.name.cmp(&b.name));
        listing.files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }
}
