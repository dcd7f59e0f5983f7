//! Test doubles.

mod memory_vfs;

pub use memory_vfs::MemoryVfs;
