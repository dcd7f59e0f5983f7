//! Environment properties.
//!
//! A flat map of upper-case keys to scalar values, stored under
//! `LOCAL.Environment`.

use std::rc::Rc;

use serde_json::{Map, Value};
use vesta_registry::{now_millis, Hive, Registry};

const ENVIRONMENT_KEY: &str = "Environment";

/// Environment properties backed by the registry.
pub struct Environment {
    registry: Rc<Registry>,
}

impl Environment {
    /// Make sure the environment object exists.
    pub fn new(registry: Rc<Registry>) -> Self {
        if let Err(e) = registry.ensure_object(Hive::Local, ENVIRONMENT_KEY) {
            tracing::warn!("[environment] cannot create store: {}", e);
        }
        if let Err(e) = registry.set_value(Hive::Kernel, "loadTime.environment", now_millis()) {
            tracing::debug!("[environment] cannot record load time: {}", e);
        }
        Self { registry }
    }

    /// Set `key` (case-insensitive) to a string, number or boolean.
    ///
    /// Returns false for empty or dotted keys, empty strings, and any other
    /// value type.
    pub fn set_property(&self, key: &str, value: Value) -> bool {
        let Some(path) = property_path(key) else {
            return false;
        };
        let accepted = match &value {
            Value::String(s) => !s.is_empty(),
            Value::Number(_) | Value::Bool(_) => true,
            _ => false,
        };
        if !accepted {
            tracing::debug!("[environment] rejected value for {}", key);
            return false;
        }

        match self.registry.set_value(Hive::Local, &path, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[environment] cannot set {}: {}", key, e);
                false
            }
        }
    }

    /// Value of `key` (case-insensitive).
    pub fn get_property(&self, key: &str) -> Option<Value> {
        self.registry.get_value(Hive::Local, &property_path(key)?)
    }

    /// Every property.
    pub fn all(&self) -> Map<String, Value> {
        match self.registry.get_value(Hive::Local, ENVIRONMENT_KEY) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn property_path(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() || key.contains('.') {
        return None;
    }
    Some(format!("{}.{}", ENVIRONMENT_KEY, key.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vesta_vfs::MemoryVfs;

    fn environment() -> Environment {
        let fs = Rc::new(MemoryVfs::new());
        Environment::new(Rc::new(Registry::open(fs, "/System/Registry.json")))
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let env = environment();

        assert!(env.set_property("theme", json!("dark")));

        assert_eq!(env.get_property("THEME"), Some(json!("dark")));
        assert_eq!(env.get_property("Theme"), Some(json!("dark")));
        assert!(env.all().contains_key("THEME"));
    }

    #[test]
    fn test_scalar_values_only() {
        let env = environment();

        assert!(env.set_property("volume", json!(0)));
        assert!(env.set_property("muted", json!(false)));
        assert!(!env.set_property("empty", json!("")));
        assert!(!env.set_property("list", json!([1, 2])));
        assert!(!env.set_property("nothing", Value::Null));

        assert_eq!(env.get_property("volume"), Some(json!(0)));
        assert_eq!(env.get_property("empty"), None);
    }

    #[test]
    fn test_bad_keys() {
        let env = environment();

        assert!(!env.set_property("", json!("x")));
        assert!(!env.set_property("a.b", json!("x")));
        assert_eq!(env.get_property("a.b"), None);
    }
}
