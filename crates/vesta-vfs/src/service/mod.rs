//! Storage adapter interface.

mod trait_def;

pub use trait_def::StorageAdapter;
