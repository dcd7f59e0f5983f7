//! Built-in behavior scripts of the standard states.
//!
//! ```text
//!   boot ──(pause)──► login ──(pause)──► desktop (spawns startup apps)
//!
//!   any guarded failure ──► crash (report + recent log lines)
//! ```

use std::rc::Rc;

use serde_json::Value;
use vesta_registry::Hive;
use vesta_session::states::{BOOT, CRASH, DESKTOP, LOGIN};
use vesta_session::{script_key, ScriptError};

use crate::constants::{
    CRASH_BANNER, CRASH_SLOT, DEFAULT_USERNAME, PREFERENCES_FILE, STATUS_SLOT, USERNAME_SLOT,
    WELCOME_TEXT,
};
use crate::error::CrashReason;
use crate::runtime::{Runtime, Scripts};
use crate::users::default_preferences;

/// Register the scripts of the standard state table.
pub fn register_builtin(scripts: &mut Scripts) {
    scripts.register(script_key(BOOT), boot);
    scripts.register(script_key(LOGIN), login);
    scripts.register(script_key(DESKTOP), desktop);
    scripts.register(script_key(CRASH), crash);
}

async fn boot(runtime: Rc<Runtime>) -> Result<(), ScriptError> {
    let set_up = runtime
        .registry()
        .get_value(Hive::Local, "initialSetup.completed")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !set_up {
        runtime
            .session()
            .stage()
            .set_slot_text(STATUS_SLOT, WELCOME_TEXT);
    }

    tokio::time::sleep(runtime.config().boot_pause()).await;
    runtime.load_state(LOGIN, Value::Null, false).await?;
    Ok(())
}

async fn login(runtime: Rc<Runtime>) -> Result<(), ScriptError> {
    let stored = runtime
        .fs()
        .read_to_string(PREFERENCES_FILE)
        .ok()
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
        .filter(Value::is_object);
    let data = match stored {
        Some(data) => data,
        None => {
            let defaults = default_preferences("");
            runtime
                .fs()
                .write_file(PREFERENCES_FILE, &serde_json::to_vec_pretty(&defaults)?)?;
            defaults
        }
    };

    let username = data
        .get("username")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_USERNAME)
        .to_string();
    runtime.user_data().set(data);
    runtime
        .session()
        .stage()
        .set_slot_text(USERNAME_SLOT, &username);

    tokio::time::sleep(runtime.config().login_pause()).await;
    runtime.load_state(DESKTOP, Value::Null, false).await?;
    Ok(())
}

async fn desktop(runtime: Rc<Runtime>) -> Result<(), ScriptError> {
    for id in runtime.catalog().startup_ids() {
        runtime.spawn_app(&id, None, Value::Null).await?;
    }
    Ok(())
}

async fn crash(runtime: Rc<Runtime>) -> Result<(), ScriptError> {
    let reason = serde_json::from_value::<CrashReason>(runtime.state_props(CRASH)["reason"].clone())
        .unwrap_or_else(|_| CrashReason::new("Unknown", "no details were recorded"));

    let mut report = format!("{}\n\n{}: {}", CRASH_BANNER, reason.kind, reason.message);
    let lines = runtime.logbook().newest_first();
    if !lines.is_empty() {
        report.push_str("\n\n");
        report.push_str(&lines.join("\n"));
    }
    runtime.session().stage().set_slot_text(CRASH_SLOT, &report);
    Ok(())
}
