//! The per-user daemon.
//!
//! Spawned when a user signs in. While it lives, every change to the
//! runtime's user data is mirrored into `LOCAL.CurrentUser` and the user's
//! preferences file. Killing it logs the user off.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use serde_json::{json, Value};
use vesta_cell::SubscriptionId;
use vesta_kernel::{Process, ProcessError, ProcessInfo};
use vesta_registry::{now_millis, Hive};
use vesta_session::states::LOGIN;
use vesta_session::ScriptError;
use vesta_vfs::join_path;

use crate::constants::USER_FOLDERS;
use crate::runtime::Runtime;
use crate::users::{default_preferences, preferences_path, user_folder};

/// Session process of one signed-in user.
pub struct UserDaemon {
    info: ProcessInfo,
    username: String,
    runtime: Weak<Runtime>,
    /// Mirror subscription on the runtime's user data
    mirror: Cell<Option<SubscriptionId>>,
}

impl UserDaemon {
    /// Create the daemon for `username` (lower-cased).
    pub fn new(info: ProcessInfo, username: &str, runtime: &Rc<Runtime>) -> Rc<Self> {
        Rc::new(Self {
            info,
            username: username.trim().to_lowercase(),
            runtime: Rc::downgrade(runtime),
            mirror: Cell::new(None),
        })
    }

    /// The signed-in user.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn runtime(&self) -> Result<Rc<Runtime>, ProcessError> {
        self.runtime
            .upgrade()
            .ok_or_else(|| ProcessError::failed("runtime is gone"))
    }

    /// Load the preferences file into the user data, rewriting it with
    /// defaults when it is missing or unreadable.
    fn load_preferences(&self, runtime: &Runtime) {
        let path = preferences_path(&self.username);
        let loaded = runtime
            .fs()
            .read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .filter(Value::is_object);

        let data = match loaded {
            Some(data) => data,
            None => {
                tracing::warn!("[userdaemon] {} unreadable, restoring defaults", path);
                let defaults = default_preferences(&self.username);
                let written = serde_json::to_vec_pretty(&defaults)
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| {
                        runtime
                            .fs()
                            .write_file(&path, &bytes)
                            .map_err(|e| e.to_string())
                    });
                if let Err(e) = written {
                    tracing::warn!("[userdaemon] cannot write {}: {}", path, e);
                }
                defaults
            }
        };
        runtime.user_data().set(data);
    }

    fn ensure_folders(&self, runtime: &Runtime) -> Result<(), ProcessError> {
        let home = user_folder(&self.username);
        for folder in USER_FOLDERS {
            runtime
                .fs()
                .create_directory(&join_path(&home, folder))
                .map_err(|e| ProcessError::failed(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Process for UserDaemon {
    fn info(&self) -> &ProcessInfo {
        &self.info
    }

    async fn start(&self) -> Result<(), ProcessError> {
        let runtime = self.runtime()?;
        tracing::info!("[userdaemon] PID={} signing in {}", self.info.pid, self.username);

        let registry = runtime.registry();
        let recorded = registry
            .set_value(Hive::Local, "UserDaemon.lastLoginName", &self.username)
            .and_then(|()| {
                registry.set_value(Hive::Local, "UserDaemon.lastLoginTime", now_millis())
            });
        if let Err(e) = recorded {
            tracing::warn!("[userdaemon] cannot record login: {}", e);
        }

        self.load_preferences(&runtime);
        self.ensure_folders(&runtime)?;

        let registry = Rc::clone(runtime.registry());
        let fs = Rc::clone(runtime.fs());
        let path = preferences_path(&self.username);
        let mirror = runtime.user_data().subscribe(move |data| {
            if let Err(e) = registry.set_value(Hive::Local, "CurrentUser", data) {
                tracing::warn!("[userdaemon] cannot mirror user data: {}", e);
            }
            match serde_json::to_vec_pretty(data) {
                Ok(bytes) => {
                    if let Err(e) = fs.write_file(&path, &bytes) {
                        tracing::warn!("[userdaemon] cannot save {}: {}", path, e);
                    }
                }
                Err(e) => tracing::warn!("[userdaemon] cannot serialize user data: {}", e),
            }
        });
        self.mirror.set(Some(mirror));
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        let runtime = self.runtime()?;
        if let Some(mirror) = self.mirror.take() {
            runtime.user_data().unsubscribe(mirror);
        }
        tracing::info!("[userdaemon] PID={} signing out {}", self.info.pid, self.username);

        runtime.close_all_windows().await;
        let task_runtime = Rc::clone(&runtime);
        runtime.spawn_guarded(async move {
            task_runtime
                .load_state(LOGIN, json!({ "type": "logout" }), false)
                .await?;
            Ok::<(), ScriptError>(())
        });
        Ok(())
    }
}
