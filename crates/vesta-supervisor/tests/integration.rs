//! Integration tests for the booted runtime.
//!
//! Everything runs against in-memory storage, a headless document and a
//! headless stage, on a paused clock inside a `LocalSet`.

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::task::LocalSet;
use tracing_subscriber::prelude::*;
use vesta_apps::{App, AppError, AppProcess};
use vesta_desktop::testing::HeadlessDocument;
use vesta_desktop::DialogKind;
use vesta_kernel::{AppDescriptor, Process, SpawnError};
use vesta_registry::Hive;
use vesta_session::states::{DESKTOP, LOGIN};
use vesta_session::testing::HeadlessStage;
use vesta_session::{ScriptError, CRASH_STATE_ID};
use vesta_supervisor::constants::{
    CRASH_BANNER, CRASH_SLOT, DEFAULT_USERNAME, PREFERENCES_FILE, RUNTIME_CONFIG_PATH,
    STATUS_SLOT, USERNAME_SLOT, WELCOME_TEXT,
};
use vesta_supervisor::{BootError, CrashReason, Host, LogBook, PowerAction, Runtime};
use vesta_vfs::{DiskVfs, MemoryVfs, StorageAdapter};

/// Long enough for boot, login and desktop with default timings.
const SETTLE: Duration = Duration::from_secs(10);

struct Idle;

#[async_trait(?Send)]
impl App for Idle {
    async fn render(&self, _process: &AppProcess) -> Result<(), AppError> {
        Ok(())
    }
}

struct Refuser;

#[async_trait(?Send)]
impl App for Refuser {
    async fn start(&self, _process: &AppProcess) -> Result<(), AppError> {
        Err(AppError::load("refusing to start"))
    }

    async fn render(&self, _process: &AppProcess) -> Result<(), AppError> {
        Ok(())
    }
}

async fn explode() -> Result<(), ScriptError> {
    panic!("guarded task blew up")
}

async fn fail_quietly() -> Result<(), ScriptError> {
    Err("second failure".into())
}

fn idle(_: &Value) -> Box<dyn App> {
    Box::new(Idle)
}

fn refuser(_: &Value) -> Box<dyn App> {
    Box::new(Refuser)
}

struct Fixture {
    fs: Rc<MemoryVfs>,
    document: Rc<HeadlessDocument>,
    stage: Rc<HeadlessStage>,
    logbook: LogBook,
}

impl Fixture {
    fn new() -> Self {
        Self {
            fs: Rc::new(MemoryVfs::new()),
            document: Rc::new(HeadlessDocument::new()),
            stage: Rc::new(HeadlessStage::new()),
            logbook: LogBook::new(64),
        }
    }

    fn host(&self) -> Host {
        Host {
            fs: self.fs.clone(),
            document: self.document.clone(),
            stage: self.stage.clone(),
            logbook: self.logbook.clone(),
        }
    }

    /// Boot and register a windowed `notes` app and an auto-run `clock`.
    async fn boot(&self) -> Rc<Runtime> {
        let runtime = Runtime::boot(self.host()).await.unwrap();
        let catalog = runtime.catalog();
        catalog
            .load_app(AppDescriptor::new("notes", "Notes"), idle)
            .unwrap();
        catalog
            .load_app(AppDescriptor::new("clock", "Clock").auto_run(), idle)
            .unwrap();
        runtime
    }
}

async fn local<F: Future<Output = ()>>(test: F) {
    LocalSet::new().run_until(test).await;
}

// ============================================================================
// Boot
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_boot_chain_reaches_desktop() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(fx.stage.mounted_class().as_deref(), Some("boot-screen"));
        assert_eq!(fx.stage.slot(STATUS_SLOT).as_deref(), Some(WELCOME_TEXT));

        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert!(runtime.in_state(LOGIN));
        assert_eq!(fx.stage.slot(USERNAME_SLOT).as_deref(), Some(DEFAULT_USERNAME));
        assert!(fx.fs.exists(PREFERENCES_FILE));

        tokio::time::sleep(SETTLE).await;
        assert!(runtime.in_state(DESKTOP));
        assert!(!runtime.is_crashing());

        let surfaces = fx.document.surfaces();
        assert_eq!(surfaces.len(), 1);
        let clock = fx.document.surface(surfaces[0]).unwrap();
        assert_eq!(clock.app_id, "clock");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_system_processes() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;

        let init = runtime.init_pid().unwrap();
        let renderer = runtime.renderer().unwrap();
        assert_eq!(renderer.info().parent, Some(init));
        assert!(renderer.info().is_critical());
        assert_eq!(runtime.catalog().default_parent(), Some(renderer.info().pid));
        assert!(runtime
            .registry()
            .contains(Hive::Kernel, "loadTime.supervisor"));
        assert!(fx.fs.exists("/System/Registry.json"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_completed_setup_skips_welcome() {
    local(async {
        let fx = Fixture::new();
        fx.fs
            .write_file(
                "/System/Registry.json",
                br#"{"LOCAL": {"initialSetup": {"completed": true}}}"#,
            )
            .unwrap();
        let _runtime = fx.boot().await;

        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(fx.stage.mounted_class().as_deref(), Some("boot-screen"));
        assert_eq!(fx.stage.slot(STATUS_SLOT), None);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_config_overrides_initial_state_and_timings() {
    local(async {
        let fx = Fixture::new();
        fx.fs
            .write_file(
                RUNTIME_CONFIG_PATH,
                br#"{"initialState": "login", "timings": {"loginPauseMs": 0}}"#,
            )
            .unwrap();
        let runtime = fx.boot().await;

        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert!(runtime.in_state(DESKTOP));
        assert!(!fx.stage.events().contains(&String::from("mount:boot-screen")));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_unknown_initial_state_fails_boot() {
    local(async {
        let fx = Fixture::new();
        fx.fs
            .write_file(RUNTIME_CONFIG_PATH, br#"{"initialState": "nowhere"}"#)
            .unwrap();

        let result = Runtime::boot(fx.host()).await;

        assert!(matches!(result, Err(BootError::UnknownState(ref s)) if s == "nowhere"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_missing_render_target_fails_boot() {
    local(async {
        let fx = Fixture {
            document: Rc::new(HeadlessDocument::new().without_render_target()),
            ..Fixture::new()
        };

        let result = Runtime::boot(fx.host()).await;

        assert!(matches!(
            result,
            Err(BootError::Spawn(SpawnError::Build { ref name, .. })) if name == "renderer"
        ));
        tokio::time::sleep(SETTLE).await;
        assert!(fx.stage.events().is_empty());
    })
    .await;
}

// ============================================================================
// Applications
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unknown_app_shows_dialog() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;

        let spawned = runtime.spawn_app("ghost", None, Value::Null).await.unwrap();

        assert!(spawned.is_none());
        let dialogs = fx.document.dialogs();
        assert_eq!(dialogs.len(), 1);
        assert_eq!(dialogs[0].title, "Application not found");
        assert_eq!(dialogs[0].kind, DialogKind::Warning);
        assert!(!runtime.is_crashing());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_spawned_apps_are_children_of_renderer() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;

        let notes = runtime
            .spawn_app("notes", None, json!({"file": "todo.txt"}))
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let renderer = runtime.renderer().unwrap();
        assert_eq!(notes.info().parent, Some(renderer.info().pid));
        assert!(renderer.is_mounted(notes.pid()));
        assert_eq!(renderer.windows().focused().get(), Some(notes.pid()));
    })
    .await;
}

// ============================================================================
// Crash handling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failing_startup_app_crashes_runtime() {
    local(async {
        let fx = Fixture::new();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(fx.logbook.clone()));
        let runtime = fx.boot().await;
        runtime
            .catalog()
            .load_app(AppDescriptor::new("broken", "Broken").auto_run(), refuser)
            .unwrap();

        tokio::time::sleep(SETTLE).await;

        assert!(runtime.is_crashing());
        assert_eq!(fx.stage.mounted_class().as_deref(), Some(CRASH_STATE_ID));
        let report = fx.stage.slot(CRASH_SLOT).unwrap();
        assert!(report.starts_with(CRASH_BANNER));
        assert!(report.contains("ScriptError: boot-screen: login: desktop:"));
        assert!(report.contains("refusing to start"));
        assert!(report.contains("[ERROR]"));

        let reason: CrashReason =
            serde_json::from_value(runtime.state_props("crash")["reason"].clone()).unwrap();
        assert_eq!(reason.kind, "ScriptError");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_guarded_panic_crashes_once() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;

        runtime.spawn_guarded(explode());
        runtime.spawn_guarded(fail_quietly());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let reason: CrashReason =
            serde_json::from_value(runtime.state_props("crash")["reason"].clone()).unwrap();
        assert_eq!(reason, CrashReason::new("Panic", "guarded task blew up"));
        assert_eq!(fx.stage.mounted_class().as_deref(), Some(CRASH_STATE_ID));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_crashing_freezes_session_and_spawns() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;

        runtime.crash(CrashReason::new("Error", "manual")).await;
        tokio::time::sleep(SETTLE).await;

        assert_eq!(fx.stage.mounted_class().as_deref(), Some(CRASH_STATE_ID));
        assert!(matches!(
            runtime.spawn_app("notes", None, Value::Null).await,
            Err(AppError::Spawn(SpawnError::Crashing { .. }))
        ));
        assert!(fx.document.surfaces().is_empty());
    })
    .await;
}

// ============================================================================
// Power
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_logoff_closes_windows_and_returns_to_login() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;
        tokio::time::sleep(SETTLE).await;
        let notes = runtime
            .spawn_app("notes", None, Value::Null)
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        runtime.logoff().await.unwrap();

        assert!(notes.info().is_disposed());
        assert_eq!(runtime.power().get(), Some(PowerAction::Logoff));
        assert_eq!(runtime.state_props(LOGIN)["type"], "logout");
        assert!(fx
            .stage
            .events()
            .iter()
            .any(|e| e == "unmount:desktop"));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_from_login_is_instant() {
    local(async {
        let fx = Fixture::new();
        fx.fs
            .write_file(
                RUNTIME_CONFIG_PATH,
                br#"{"initialState": "login", "timings": {"loginPauseMs": 60000}}"#,
            )
            .unwrap();
        let runtime = fx.boot().await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(runtime.in_state(LOGIN));

        let started = tokio::time::Instant::now();
        let shutdown = runtime.shutdown();
        tokio::pin!(shutdown);
        tokio::select! {
            _ = &mut shutdown => panic!("login script should still be pausing"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }

        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(runtime.state_props(LOGIN)["type"], "shutdown");
        assert!(!fx.stage.is_hidden());
    })
    .await;
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_user_daemon_mirrors_preferences() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;
        tokio::time::sleep(SETTLE).await;
        assert!(runtime.users().create_user("Alice", false).unwrap());

        let daemon = runtime.start_user_session("alice").await.unwrap();

        assert_eq!(runtime.user_data().get()["username"], "alice");
        assert!(fx.fs.exists("/Users/alice/Documents"));
        assert!(fx.fs.exists("/Users/alice/Apps"));
        assert_eq!(
            runtime
                .registry()
                .get_value(Hive::Local, "UserDaemon.lastLoginName"),
            Some(json!("alice"))
        );

        runtime
            .user_data()
            .update(|data| data["theme"] = json!("light"));

        assert_eq!(
            runtime.registry().get_value(Hive::Local, "CurrentUser.theme"),
            Some(json!("light"))
        );
        let saved: Value = serde_json::from_str(
            &fx.fs.read_to_string("/Users/alice/preferences.json").unwrap(),
        )
        .unwrap();
        assert_eq!(saved["theme"], "light");

        runtime.handler().kill(daemon.info().pid, false).await;
        runtime
            .user_data()
            .update(|data| data["theme"] = json!("dark"));
        assert_eq!(
            runtime.registry().get_value(Hive::Local, "CurrentUser.theme"),
            Some(json!("light"))
        );

        tokio::time::sleep(SETTLE).await;
        assert_eq!(runtime.state_props(LOGIN)["type"], "logout");
        assert!(!runtime.is_crashing());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_daemon_restores_corrupt_preferences() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;
        runtime.users().create_user("bob", false).unwrap();
        fx.fs
            .write_file("/Users/bob/preferences.json", b"not json")
            .unwrap();

        runtime.start_user_session("bob").await.unwrap();

        assert_eq!(runtime.user_data().get()["accent"], "ff6200");
        let restored: Value =
            serde_json::from_str(&fx.fs.read_to_string("/Users/bob/preferences.json").unwrap())
                .unwrap();
        assert_eq!(restored["username"], "bob");
    })
    .await;
}

// ============================================================================
// Environment
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_environment_lives_in_local_hive() {
    local(async {
        let fx = Fixture::new();
        let runtime = fx.boot().await;

        assert!(runtime.environment().set_property("locale", json!("en-GB")));

        assert_eq!(
            runtime
                .registry()
                .get_value(Hive::Local, "Environment.LOCALE"),
            Some(json!("en-GB"))
        );
    })
    .await;
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_accounts_survive_reboot_on_disk() {
    local(async {
        let dir = tempfile::tempdir().unwrap();

        for round in 0..2 {
            let fs: Rc<dyn StorageAdapter> = Rc::new(DiskVfs::new(dir.path()).unwrap());
            let runtime = Runtime::boot(Host {
                fs,
                document: Rc::new(HeadlessDocument::new()),
                stage: Rc::new(HeadlessStage::new()),
                logbook: LogBook::default(),
            })
            .await
            .unwrap();

            if round == 0 {
                assert!(runtime.users().create_user("dana", true).unwrap());
            } else {
                assert!(runtime.users().get_user("dana").unwrap().admin);
                assert!(dir.path().join("Users/dana/preferences.json").exists());
            }
        }
    })
    .await;
}
