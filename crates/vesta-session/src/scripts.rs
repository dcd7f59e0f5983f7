//! Statically registered behavior scripts.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::error::ScriptError;

/// Future returned by a behavior script.
pub type ScriptFuture = Pin<Box<dyn Future<Output = Result<(), ScriptError>>>>;

/// Entry function of a behavior script, given the runtime context `C`.
pub type StateScript<C> = Rc<dyn Fn(C) -> ScriptFuture>;

/// Behavior scripts by key.
pub struct ScriptRegistry<C> {
    scripts: BTreeMap<String, StateScript<C>>,
}

impl<C: 'static> Default for ScriptRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> ScriptRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            scripts: BTreeMap::new(),
        }
    }

    /// Register `entry` under `key`, replacing any previous entry.
    pub fn register<F, Fut>(&mut self, key: impl Into<String>, entry: F)
    where
        F: Fn(C) -> Fut + 'static,
        Fut: Future<Output = Result<(), ScriptError>> + 'static,
    {
        let entry: StateScript<C> = Rc::new(move |ctx| Box::pin(entry(ctx)));
        self.scripts.insert(key.into(), entry);
    }

    /// The entry function under `key`.
    pub fn get(&self, key: &str) -> Option<StateScript<C>> {
        self.scripts.get(key).cloned()
    }

    /// Whether `key` has an entry function.
    pub fn contains(&self, key: &str) -> bool {
        self.scripts.contains_key(key)
    }
}
