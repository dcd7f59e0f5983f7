//! In-memory storage adapter for testing.
//!
//! Provides a BTreeMap-based adapter that doesn't persist data.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::core::{filename, normalize_path, parent_path, DirEntry, DirListing, VfsError};
use crate::service::StorageAdapter;

#[derive(Clone, Debug)]
enum Node {
    Directory { created_at: u64 },
    File { content: Vec<u8>, created_at: u64, modified_at: u64 },
}

/// In-memory storage adapter.
pub struct MemoryVfs {
    /// Node storage (normalized path -> node)
    nodes: RefCell<BTreeMap<String, Node>>,
    /// Current timestamp generator
    now: Cell<u64>,
    /// When set, every write fails (exercises best-effort persistence)
    fail_writes: Cell<bool>,
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVfs {
    /// Create a new empty in-memory adapter containing only `/`.
    pub fn new() -> Self {
        let vfs = Self {
            nodes: RefCell::new(BTreeMap::new()),
            now: Cell::new(1000),
            fail_writes: Cell::new(false),
        };
        vfs.nodes
            .borrow_mut()
            .insert(String::from("/"), Node::Directory { created_at: 1000 });
        vfs
    }

    /// Get current timestamp and advance it.
    fn get_now(&self) -> u64 {
        let current = self.now.get();
        self.now.set(current + 1);
        current
    }

    /// Set the current timestamp (for testing).
    pub fn set_now(&self, timestamp: u64) {
        self.now.set(timestamp);
    }

    /// Make every subsequent write fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of stored files.
    pub fn file_count(&self) -> usize {
        self.nodes
            .borrow()
            .values()
            .filter(|n| matches!(n, Node::File { .. }))
            .count()
    }

    fn mkdir_p(&self, path: &str) -> Result<(), VfsError> {
        let mut current = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current.push('/');
            current.push_str(component);

            let existing = self.nodes.borrow().get(&current).cloned();
            match existing {
                Some(Node::Directory { .. }) => {}
                Some(Node::File { .. }) => return Err(VfsError::NotADirectory(current)),
                None => {
                    let created_at = self.get_now();
                    self.nodes
                        .borrow_mut()
                        .insert(current.clone(), Node::Directory { created_at });
                }
            }
        }
        Ok(())
    }
}

impl StorageAdapter for MemoryVfs {
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), VfsError> {
        let path = normalize_path(path)?;
        if self.fail_writes.get() {
            return Err(VfsError::io(format!("write refused: {}", path)));
        }
        if path == "/" {
            return Err(VfsError::NotAFile(path));
        }

        self.mkdir_p(&parent_path(&path))?;

        let now = self.get_now();
        let mut nodes = self.nodes.borrow_mut();
        let created_at = match nodes.get(&path) {
            Some(Node::Directory { .. }) => return Err(VfsError::NotAFile(path)),
            Some(Node::File { created_at, .. }) => *created_at,
            None => now,
        };
        nodes.insert(
            path,
            Node::File {
                content: content.to_vec(),
                created_at,
                modified_at: now,
            },
        );
        Ok(())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let path = normalize_path(path)?;
        match self.nodes.borrow().get(&path) {
            Some(Node::File { content, .. }) => Ok(content.clone()),
            Some(Node::Directory { .. }) => Err(VfsError::NotAFile(path)),
            None => Err(VfsError::NotFound(path)),
        }
    }

    fn create_directory(&self, path: &str) -> Result<(), VfsError> {
        let path = normalize_path(path)?;
        if self.fail_writes.get() {
            return Err(VfsError::io(format!("mkdir refused: {}", path)));
        }
        self.mkdir_p(&path)
    }

    fn read_directory(&self, path: &str) -> Result<DirListing, VfsError> {
        let path = normalize_path(path)?;
        let nodes = self.nodes.borrow();
        match nodes.get(&path) {
            Some(Node::Directory { .. }) => {}
            Some(Node::File { .. }) => return Err(VfsError::NotADirectory(path)),
            None => return Err(VfsError::NotFound(path)),
        }

        let mut listing = DirListing::default();
        for (child, node) in nodes.iter() {
            if child == "/" || parent_path(child) != path {
                continue;
            }
            let name = String::from(filename(child));
            match node {
                Node::Directory { created_at } => listing.dirs.push(DirEntry {
                    name,
                    size: 0,
                    created_at: *created_at,
                    modified_at: *created_at,
                }),
                Node::File {
                    content,
                    created_at,
                    modified_at,
                } => listing.files.push(DirEntry {
                    name,
                    size: content.len() as u64,
                    created_at: *created_at,
                    modified_at: *modified_at,
                }),
            }
        }
        Ok(listing)
    }

    fn exists(&self, path: &str) -> bool {
        normalize_path(path)
            .map(|p| self.nodes.borrow().contains_key(&p))
            .unwrap_or(false)
    }
}
