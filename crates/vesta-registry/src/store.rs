//! The registry store and its write-through persistence.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use vesta_cell::{Observable, SubscriptionId};
use vesta_vfs::StorageAdapter;

use crate::error::RegistryError;
use crate::hive::Hive;
use crate::tree;

/// Where the registry blob lives in storage.
pub const DEFAULT_REGISTRY_PATH: &str = "/System/Registry.json";

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Hierarchical configuration store.
pub struct Registry {
    /// The whole tree; every `set` is persisted
    store: Observable<Value>,
    /// Storage path of the blob
    path: String,
    /// Write-through subscription
    persist: SubscriptionId,
}

impl Registry {
    /// Load the registry from `path`, self-healing to an empty tree.
    ///
    /// A missing, unreadable or unparsable blob is replaced by `{}` and
    /// written back immediately. Load bookkeeping is recorded under
    /// `KERNEL.Registry`.
    pub fn open(fs: Rc<dyn StorageAdapter>, path: &str) -> Self {
        let (tree, initial_size) = match Self::read_blob(fs.as_ref(), path) {
            Ok(loaded) => loaded,
            Err(reason) => {
                tracing::warn!("[registry] {} unusable ({}), resetting", path, reason);
                (Value::Object(Map::new()), 2)
            }
        };

        let store = Observable::new(tree);
        let blob_path = path.to_string();
        let persist = store.subscribe(move |tree: &Value| {
            let bytes = match serde_json::to_vec(tree) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("[registry] serialize failed: {}", e);
                    return;
                }
            };
            if let Err(e) = fs.write_file(&blob_path, &bytes) {
                tracing::warn!("[registry] persist to {} failed: {}", blob_path, e);
            }
        });

        let registry = Self {
            store,
            path: path.to_string(),
            persist,
        };
        registry.record_load(initial_size);
        tracing::info!("[registry] loaded {} ({} bytes)", path, initial_size);
        registry
    }

    fn read_blob(fs: &dyn StorageAdapter, path: &str) -> Result<(Value, usize), String> {
        let text = fs.read_to_string(path).map_err(|e| e.to_string())?;
        let tree: Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
        if !tree.is_object() {
            return Err(String::from("root is not an object"));
        }
        Ok((tree, text.len()))
    }

    fn record_load(&self, initial_size: usize) {
        let bookkeeping = [
            ("Registry.lastLoadTime", Value::from(now_millis())),
            ("Registry.initialSize", Value::from(initial_size as u64)),
        ];
        for (path, value) in bookkeeping {
            if let Err(e) = self.set_value(Hive::Kernel, path, value) {
                tracing::warn!("[registry] bookkeeping {} failed: {}", path, e);
            }
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read the value at `hive.path`.
    ///
    /// `None` when any segment is absent. Stored falsy values (`0`, `false`,
    /// `""`) come back as `Some`.
    pub fn get_value(&self, hive: Hive, path: &str) -> Option<Value> {
        let segments = tree::split_path(path).ok()?;
        self.store.with(|root| {
            root.get(hive.as_str())
                .and_then(|node| tree::get(node, &segments))
                .cloned()
        })
    }

    /// Read and deserialize the value at `hive.path`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        hive: Hive,
        path: &str,
    ) -> Result<Option<T>, RegistryError> {
        match self.get_value(hive, path) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| RegistryError::Serde {
                    path: format!("{}.{}", hive, path),
                    source,
                }),
        }
    }

    /// Whether anything is stored at `hive.path`.
    pub fn contains(&self, hive: Hive, path: &str) -> bool {
        self.get_value(hive, path).is_some()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Write `value` at `hive.path`, creating intermediate nodes.
    ///
    /// A value serializing to `null` deletes the leaf. Every call replaces the
    /// whole tree in the store cell, which notifies subscribers and persists.
    pub fn set_value<T: Serialize>(
        &self,
        hive: Hive,
        path: &str,
        value: T,
    ) -> Result<(), RegistryError> {
        let segments = tree::split_path(path)?;
        let value = serde_json::to_value(value).map_err(|source| RegistryError::Serde {
            path: format!("{}.{}", hive, path),
            source,
        })?;

        let mut root = self.store.get();
        let mut full = Vec::with_capacity(segments.len() + 1);
        full.push(hive.as_str());
        full.extend(segments);
        tree::set(&mut root, &full, value)?;

        self.store.set(root);
        Ok(())
    }

    /// Make sure an object exists at `hive.path` without touching its contents.
    pub fn ensure_object(&self, hive: Hive, path: &str) -> Result<(), RegistryError> {
        match self.get_value(hive, path) {
            Some(Value::Object(_)) => Ok(()),
            Some(_) => Err(RegistryError::NotAnObject {
                path: format!("{}.{}", hive, path),
            }),
            None => self.set_value(hive, path, Value::Object(Map::new())),
        }
    }

    // ========================================================================
    // Store access
    // ========================================================================

    /// The underlying store cell. Setting it replaces the whole tree.
    pub fn store(&self) -> &Observable<Value> {
        &self.store
    }

    /// Storage path of the persisted blob.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Detach persistence and destroy the store cell.
    pub fn stop(&self) {
        self.store.unsubscribe(self.persist);
        self.store.destroy();
        tracing::info!("[registry] stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vesta_vfs::MemoryVfs;

    fn open() -> (Rc<MemoryVfs>, Registry) {
        let fs = Rc::new(MemoryVfs::new());
        let registry = Registry::open(fs.clone(), DEFAULT_REGISTRY_PATH);
        (fs, registry)
    }

    fn persisted(fs: &MemoryVfs) -> Value {
        serde_json::from_slice(&fs.read_file(DEFAULT_REGISTRY_PATH).unwrap()).unwrap()
    }

    // ========================================================================
    // Load / self-heal
    // ========================================================================

    #[test]
    fn test_missing_blob_is_created() {
        let (fs, registry) = open();

        assert!(fs.exists(DEFAULT_REGISTRY_PATH));
        assert_eq!(
            registry.get_value(Hive::Kernel, "Registry.initialSize"),
            Some(json!(2))
        );
    }

    #[test]
    fn test_corrupt_blob_resets() {
        let fs = Rc::new(MemoryVfs::new());
        fs.write_file(DEFAULT_REGISTRY_PATH, b"{not json").unwrap();

        let registry = Registry::open(fs.clone(), DEFAULT_REGISTRY_PATH);

        assert_eq!(registry.get_value(Hive::Local, "anything"), None);
        let blob = persisted(&fs);
        assert!(blob.get("KERNEL").is_some());
    }

    #[test]
    fn test_existing_blob_is_loaded() {
        let fs = Rc::new(MemoryVfs::new());
        fs.write_file(DEFAULT_REGISTRY_PATH, br#"{"LOCAL":{"theme":"dark"}}"#)
            .unwrap();

        let registry = Registry::open(fs, DEFAULT_REGISTRY_PATH);

        assert_eq!(registry.get_value(Hive::Local, "theme"), Some(json!("dark")));
    }

    // ========================================================================
    // Reads and writes
    // ========================================================================

    #[test]
    fn test_round_trip_persists() {
        let (fs, registry) = open();

        registry.set_value(Hive::Local, "a.b.c", 1).unwrap();

        assert_eq!(registry.get_value(Hive::Local, "a.b.c"), Some(json!(1)));
        assert_eq!(registry.get_value(Hive::Local, "a.b"), Some(json!({"c": 1})));
        assert_eq!(persisted(&fs)["LOCAL"]["a"]["b"]["c"], json!(1));
    }

    #[test]
    fn test_null_deletes() {
        let (fs, registry) = open();
        registry.set_value(Hive::Local, "a.b.c", 1).unwrap();

        registry.set_value(Hive::Local, "a.b.c", Value::Null).unwrap();

        assert_eq!(registry.get_value(Hive::Local, "a.b.c"), None);
        assert_eq!(registry.get_value(Hive::Local, "a.b"), Some(json!({})));
        assert!(persisted(&fs)["LOCAL"]["a"]["b"].get("c").is_none());
    }

    #[test]
    fn test_none_deletes() {
        let (_fs, registry) = open();
        registry.set_value(Hive::Users, "bob", "x").unwrap();

        registry.set_value(Hive::Users, "bob", Option::<u8>::None).unwrap();

        assert!(!registry.contains(Hive::Users, "bob"));
    }

    #[test]
    fn test_falsy_values_are_present() {
        let (_fs, registry) = open();
        registry.set_value(Hive::Local, "count", 0).unwrap();
        registry.set_value(Hive::Local, "flag", false).unwrap();

        assert_eq!(registry.get_value(Hive::Local, "count"), Some(json!(0)));
        assert_eq!(registry.get_value(Hive::Local, "flag"), Some(json!(false)));
    }

    #[test]
    fn test_hives_are_isolated() {
        let (_fs, registry) = open();
        registry.set_value(Hive::Apps, "x", 1).unwrap();

        assert_eq!(registry.get_value(Hive::Local, "x"), None);
    }

    #[test]
    fn test_get_as() {
        let (_fs, registry) = open();
        registry.set_value(Hive::Local, "n", 41).unwrap();

        assert_eq!(registry.get_as::<u32>(Hive::Local, "n").unwrap(), Some(41));
        assert_eq!(registry.get_as::<u32>(Hive::Local, "m").unwrap(), None);
        assert!(registry.get_as::<String>(Hive::Local, "n").is_err());
    }

    #[test]
    fn test_invalid_path() {
        let (_fs, registry) = open();
        assert!(matches!(
            registry.set_value(Hive::Local, "a..b", 1),
            Err(RegistryError::InvalidPath(_))
        ));
        assert_eq!(registry.get_value(Hive::Local, ""), None);
    }

    #[test]
    fn test_ensure_object() {
        let (_fs, registry) = open();
        registry.ensure_object(Hive::Local, "Environment").unwrap();
        registry.set_value(Hive::Local, "Environment.HOME", "/").unwrap();
        registry.ensure_object(Hive::Local, "Environment").unwrap();

        assert_eq!(
            registry.get_value(Hive::Local, "Environment"),
            Some(json!({"HOME": "/"}))
        );
    }

    // ========================================================================
    // Persistence failures
    // ========================================================================

    #[test]
    fn test_persist_failure_is_not_fatal() {
        let (fs, registry) = open();
        fs.set_fail_writes(true);

        registry.set_value(Hive::Local, "k", "v").unwrap();

        assert_eq!(registry.get_value(Hive::Local, "k"), Some(json!("v")));
        assert!(persisted(&fs)["LOCAL"].get("k").is_none());
    }

    #[test]
    fn test_stop_detaches_persistence() {
        let (fs, registry) = open();
        registry.stop();

        registry.set_value(Hive::Local, "late", 1).unwrap();

        assert!(persisted(&fs).get("LOCAL").is_none());
    }
}
