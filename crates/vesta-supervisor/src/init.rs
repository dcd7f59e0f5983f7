//! The init process.
//!
//! First process of every boot and parent of the renderer. It is critical,
//! so only a forced kill takes it down.

use std::rc::{Rc, Weak};

use async_trait::async_trait;
use serde_json::{Map, Value};
use vesta_kernel::{Process, ProcessError, ProcessInfo};
use vesta_session::ScriptError;

use crate::runtime::Runtime;

/// Root system process; requests the initial state once the renderer is up.
pub struct InitProcess {
    info: ProcessInfo,
    runtime: Weak<Runtime>,
}

impl InitProcess {
    /// Create init for `runtime`. Spawn it with critical bookkeeping.
    pub fn new(info: ProcessInfo, runtime: Weak<Runtime>) -> Rc<Self> {
        Rc::new(Self { info, runtime })
    }

    /// Enter the configured initial state as a guarded task.
    pub fn jumpstart(&self) {
        let Some(runtime) = self.runtime.upgrade() else {
            tracing::warn!("[init] runtime is gone, nothing to start");
            return;
        };
        let initial = runtime.config().initial_state.clone();
        tracing::info!("[init] PID={} entering {}", self.info.pid, initial);

        let task_runtime = Rc::clone(&runtime);
        runtime.spawn_guarded(async move {
            task_runtime
                .load_state(&initial, Value::Object(Map::new()), false)
                .await?;
            Ok::<(), ScriptError>(())
        });
    }
}

#[async_trait(?Send)]
impl Process for InitProcess {
    fn info(&self) -> &ProcessInfo {
        &self.info
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        tracing::warn!("[init] PID={} stopped", self.info.pid);
        Ok(())
    }
}
