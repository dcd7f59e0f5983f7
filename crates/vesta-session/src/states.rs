//! Global state descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Table key of the boot state.
pub const BOOT: &str = "boot";
/// Table key of the login state.
pub const LOGIN: &str = "login";
/// Table key of the desktop state.
pub const DESKTOP: &str = "desktop";
/// Table key of the crash state.
pub const CRASH: &str = "crash";

/// Id of the crash state, the only state reachable while crashing.
pub const CRASH_STATE_ID: &str = "crash-screen";

/// Script key of a state bundled under `state/<dir>/`.
pub fn script_key(dir: &str) -> String {
    format!("state/{dir}/main")
}

/// A global state: presentation bundle, behavior script and label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescriptor {
    /// Markup resource
    pub markup: String,
    /// Stylesheet resource
    pub style: String,
    /// Behavior script key in the [`ScriptRegistry`](crate::ScriptRegistry)
    pub script: String,
    /// Human-readable label
    pub label: String,
    /// Identifier, also the class applied to the stage while active
    pub id: String,
}

impl StateDescriptor {
    /// A descriptor whose bundle lives under `state/<dir>/`.
    pub fn bundled(dir: &str, label: &str, id: &str) -> Self {
        Self {
            markup: format!("state/{dir}/{dir}.html"),
            style: format!("state/{dir}/{dir}.css"),
            script: script_key(dir),
            label: label.to_string(),
            id: id.to_string(),
        }
    }

    /// Name of the first empty field, if any.
    pub fn empty_field(&self) -> Option<&'static str> {
        [
            ("markup", &self.markup),
            ("style", &self.style),
            ("script", &self.script),
            ("label", &self.label),
            ("id", &self.id),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// The fixed table of global states, by key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateTable {
    states: BTreeMap<String, StateDescriptor>,
}

impl Default for StateTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl StateTable {
    /// Boot, login, desktop and crash.
    pub fn standard() -> Self {
        let states = [
            (BOOT, StateDescriptor::bundled("boot", "Boot", "boot-screen")),
            (LOGIN, StateDescriptor::bundled("login", "Login", "login")),
            (DESKTOP, StateDescriptor::bundled("desktop", "Desktop", "desktop")),
            (
                CRASH,
                StateDescriptor::bundled("crash", "Aw, snap!", CRASH_STATE_ID),
            ),
        ]
        .into_iter()
        .map(|(key, state)| (key.to_string(), state))
        .collect();
        Self { states }
    }

    /// Look up a state by key.
    pub fn get(&self, key: &str) -> Option<&StateDescriptor> {
        self.states.get(key)
    }

    /// Look up a state by id.
    pub fn by_id(&self, id: &str) -> Option<&StateDescriptor> {
        self.states.values().find(|s| s.id == id)
    }

    /// Add or replace a state.
    pub fn insert(&mut self, key: impl Into<String>, state: StateDescriptor) {
        self.states.insert(key.into(), state);
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}
