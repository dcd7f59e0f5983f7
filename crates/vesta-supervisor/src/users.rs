//! User accounts.
//!
//! Accounts live under `USERS.store.<name>`; each owns a folder under
//! `/Users/<name>` holding a `preferences.json`.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use vesta_registry::{now_millis, Hive, Registry};
use vesta_vfs::{join_path, StorageAdapter};

use crate::constants::USERS_ROOT;
use crate::error::UserError;

const STORE_KEY: &str = "store";

/// A stored account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub admin: bool,
    /// Absolute path of the user's folder
    pub user_folder: String,
}

/// Preferences a new user starts with.
pub fn default_preferences(username: &str) -> Value {
    json!({
        "username": username,
        "accent": "ff6200",
        "theme": "dark",
        "wallpaper": "default",
    })
}

/// Folder of `username`.
pub fn user_folder(username: &str) -> String {
    join_path(USERS_ROOT, username)
}

/// Preferences file of `username`.
pub fn preferences_path(username: &str) -> String {
    join_path(&user_folder(username), "preferences.json")
}

/// Account management on top of the registry and storage.
pub struct UserLogic {
    registry: Rc<Registry>,
    fs: Rc<dyn StorageAdapter>,
}

impl UserLogic {
    /// Make sure the account store exists.
    pub fn new(registry: Rc<Registry>, fs: Rc<dyn StorageAdapter>) -> Self {
        if let Err(e) = registry.ensure_object(Hive::Users, STORE_KEY) {
            tracing::warn!("[users] cannot create account store: {}", e);
        }
        if let Err(e) = registry.set_value(Hive::Kernel, "loadTime.userlogic", now_millis()) {
            tracing::debug!("[users] cannot record load time: {}", e);
        }
        Self { registry, fs }
    }

    /// Create an account with its folder and default preferences.
    ///
    /// Names are lower-cased. Returns `Ok(false)` when the account exists.
    pub fn create_user(&self, username: &str, admin: bool) -> Result<bool, UserError> {
        let username = normalize(username)?;
        if self.get_user(&username).is_some() {
            tracing::info!("[users] {} already exists", username);
            return Ok(false);
        }

        let record = UserRecord {
            username: username.clone(),
            admin,
            user_folder: user_folder(&username),
        };
        self.fs.create_directory(&record.user_folder)?;
        let preferences = serde_json::to_vec_pretty(&default_preferences(&username))?;
        self.fs
            .write_file(&preferences_path(&username), &preferences)?;
        // Recorded last: a storage failure must not leave an account behind.
        self.registry
            .set_value(Hive::Users, &store_path(&username), &record)?;

        tracing::info!("[users] created {} (admin={})", username, admin);
        Ok(true)
    }

    /// The account of `username`, if any.
    pub fn get_user(&self, username: &str) -> Option<UserRecord> {
        let username = normalize(username).ok()?;
        match self
            .registry
            .get_as::<UserRecord>(Hive::Users, &store_path(&username))
        {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("[users] unreadable account {}: {}", username, e);
                None
            }
        }
    }

    /// Every account name, sorted.
    pub fn usernames(&self) -> Vec<String> {
        match self.registry.get_value(Hive::Users, STORE_KEY) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

fn normalize(username: &str) -> Result<String, UserError> {
    let name = username.trim().to_lowercase();
    if name.is_empty() || name.contains(['.', '/']) {
        return Err(UserError::InvalidName(username.to_string()));
    }
    Ok(name)
}

fn store_path(username: &str) -> String {
    format!("{}.{}", STORE_KEY, username)
}
