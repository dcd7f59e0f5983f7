//! The runtime context.
//!
//! [`Runtime`] owns every long-lived component and is what behavior scripts,
//! the init process and the user daemon talk to. Boot wires the components
//! in dependency order:
//!
//! ```text
//!   config ─► registry ─► users, environment ─► process handler
//!                                                     │
//!        session machine (built-in scripts) ◄─────────┘
//!                    │
//!                    ▼
//!        init (critical) ─► renderer (critical, child of init)
//!                    │
//!                    └─► jumpstart: initial state
//! ```
//!
//! Any failure escaping a guarded task latches the global crash flag and
//! replaces whatever is on screen with the crash state.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use serde_json::{json, Map, Value};
use vesta_apps::{AppCatalog, AppError, AppProcess};
use vesta_cell::Observable;
use vesta_desktop::{Dialog, Document, Renderer};
use vesta_kernel::{Process, ProcessHandler, ProcessId, SpawnError};
use vesta_registry::{now_millis, Hive, Registry};
use vesta_session::states::CRASH;
use vesta_session::{
    ScriptError, ScriptRegistry, SessionMachine, Stage, StateError, StateTable, Transition,
};
use vesta_vfs::StorageAdapter;

use crate::config::RuntimeConfig;
use crate::constants::{INIT_NAME, USER_DAEMON_NAME};
use crate::daemon::UserDaemon;
use crate::environment::Environment;
use crate::error::{BootError, CrashReason};
use crate::init::InitProcess;
use crate::logbook::LogBook;
use crate::power::PowerAction;
use crate::scripts;
use crate::users::UserLogic;

/// Host services the runtime is booted against.
pub struct Host {
    /// Persistent storage
    pub fs: Rc<dyn StorageAdapter>,
    /// Where app surfaces and dialogs go
    pub document: Rc<dyn Document>,
    /// Where global states are mounted
    pub stage: Rc<dyn Stage>,
    /// Recent log lines for crash reports
    pub logbook: LogBook,
}

/// Behavior scripts, keyed by script key, receiving the runtime.
pub type Scripts = ScriptRegistry<Rc<Runtime>>;

/// The booted runtime.
pub struct Runtime {
    config: RuntimeConfig,
    fs: Rc<dyn StorageAdapter>,
    registry: Rc<Registry>,
    handler: Rc<ProcessHandler>,
    catalog: AppCatalog,
    session: SessionMachine<Rc<Runtime>>,
    states: StateTable,
    document: Rc<dyn Document>,
    /// Global crash latch, shared with the handler and the session machine
    crashing: Observable<bool>,
    users: UserLogic,
    environment: Environment,
    /// Last power action requested
    power: Observable<Option<PowerAction>>,
    /// Preferences of the signed-in user
    user_data: Observable<Value>,
    logbook: LogBook,
    init: RefCell<Option<Rc<InitProcess>>>,
    renderer: RefCell<Option<Rc<Renderer>>>,
    me: Weak<Runtime>,
}

impl Runtime {
    /// Boot with the built-in behavior scripts.
    ///
    /// Must run inside a `LocalSet`. Returns once the system processes are
    /// up; the initial state transition continues as a guarded task.
    pub async fn boot(host: Host) -> Result<Rc<Self>, BootError> {
        let mut scripts = Scripts::new();
        scripts::register_builtin(&mut scripts);
        Self::boot_with_scripts(host, scripts).await
    }

    /// Boot with a custom script registry.
    pub async fn boot_with_scripts(host: Host, scripts: Scripts) -> Result<Rc<Self>, BootError> {
        let Host {
            fs,
            document,
            stage,
            logbook,
        } = host;
        tracing::info!("[supervisor] booting");

        let config = RuntimeConfig::load(fs.as_ref());
        let states = StateTable::standard();
        if states.get(&config.initial_state).is_none() {
            return Err(BootError::UnknownState(config.initial_state));
        }

        let registry = Rc::new(Registry::open(Rc::clone(&fs), &config.registry_path));
        let users = UserLogic::new(Rc::clone(&registry), Rc::clone(&fs));
        let environment = Environment::new(Rc::clone(&registry));
        let crashing = Observable::new(false);
        let handler = ProcessHandler::new(Rc::clone(&registry), crashing.clone());
        let catalog = AppCatalog::new(Rc::clone(&registry), config.app_timings());
        let session = SessionMachine::new(
            stage,
            scripts,
            crashing.clone(),
            config.session_timings(),
        );

        let runtime = Rc::new_cyclic(|me| Self {
            config,
            fs,
            registry,
            handler,
            catalog,
            session,
            states,
            document,
            crashing,
            users,
            environment,
            power: Observable::new(None),
            user_data: Observable::new(Value::Object(Map::new())),
            logbook,
            init: RefCell::new(None),
            renderer: RefCell::new(None),
            me: me.clone(),
        });

        let init = runtime
            .handler
            .spawn(INIT_NAME, None, |info| {
                Ok(InitProcess::new(info.critical(), Rc::downgrade(&runtime)))
            })
            .await?;
        let renderer = Renderer::launch(
            &runtime.handler,
            Some(init.info().pid),
            Rc::clone(&runtime.document),
            &runtime.config.renderer_config(),
        )
        .await?;
        runtime
            .catalog
            .set_default_parent(Some(renderer.info().pid));
        *runtime.renderer.borrow_mut() = Some(renderer);
        *runtime.init.borrow_mut() = Some(Rc::clone(&init));

        if let Err(e) = runtime
            .registry
            .set_value(Hive::Kernel, "loadTime.supervisor", now_millis())
        {
            tracing::warn!("[supervisor] could not record boot time: {}", e);
        }
        tracing::info!("[supervisor] system processes up");

        init.jumpstart();
        Ok(runtime)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Effective configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Persistent storage.
    pub fn fs(&self) -> &Rc<dyn StorageAdapter> {
        &self.fs
    }

    /// The registry.
    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// The process handler.
    pub fn handler(&self) -> &Rc<ProcessHandler> {
        &self.handler
    }

    /// The application catalog.
    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// The session state machine.
    pub fn session(&self) -> &SessionMachine<Rc<Runtime>> {
        &self.session
    }

    /// The state table.
    pub fn states(&self) -> &StateTable {
        &self.states
    }

    /// The host document.
    pub fn document(&self) -> &Rc<dyn Document> {
        &self.document
    }

    /// User accounts.
    pub fn users(&self) -> &UserLogic {
        &self.users
    }

    /// Environment properties.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Last requested power action.
    pub fn power(&self) -> &Observable<Option<PowerAction>> {
        &self.power
    }

    /// Preferences of the signed-in user.
    pub fn user_data(&self) -> &Observable<Value> {
        &self.user_data
    }

    /// Recent log lines.
    pub fn logbook(&self) -> &LogBook {
        &self.logbook
    }

    /// Whether the crash latch is set.
    pub fn is_crashing(&self) -> bool {
        self.crashing.get()
    }

    /// Pid of the init process.
    pub fn init_pid(&self) -> Option<ProcessId> {
        self.init.borrow().as_ref().map(|init| init.info().pid)
    }

    /// The renderer.
    pub fn renderer(&self) -> Option<Rc<Renderer>> {
        self.renderer.borrow().clone()
    }

    fn renderer_pid(&self) -> Option<ProcessId> {
        self.renderer.borrow().as_ref().map(|r| r.info().pid)
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Transition to the state registered under `key`.
    pub async fn load_state(
        self: &Rc<Self>,
        key: &str,
        props: Value,
        instant: bool,
    ) -> Result<Transition, StateError> {
        let target = self
            .states
            .get(key)
            .cloned()
            .ok_or_else(|| StateError::UnknownState(key.to_string()))?;
        self.session
            .load_state(&target, props, instant, Rc::clone(self))
            .await
    }

    /// Props of the last transition into the state registered under `key`.
    pub fn state_props(&self, key: &str) -> Value {
        match self.states.get(key) {
            Some(state) => self.session.props_of(&state.id),
            None => Value::Object(Map::new()),
        }
    }

    /// Whether the state registered under `key` is the active one.
    pub fn in_state(&self, key: &str) -> bool {
        self.states
            .get(key)
            .is_some_and(|state| self.session.is_current(&state.id))
    }

    // ========================================================================
    // Applications
    // ========================================================================

    /// Spawn application `id`.
    ///
    /// An unknown id shows a warning dialog and yields `Ok(None)`.
    pub async fn spawn_app(
        &self,
        id: &str,
        parent: Option<ProcessId>,
        args: Value,
    ) -> Result<Option<Rc<AppProcess>>, AppError> {
        match self.catalog.spawn_app(&self.handler, id, parent, args).await {
            Ok(process) => Ok(Some(process)),
            Err(AppError::NotFound(id)) => {
                tracing::warn!("[supervisor] no application {}", id);
                self.message_box(Dialog::warning(
                    "Application not found",
                    format!("Vesta can't find an application with the id \"{id}\"."),
                ));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Show a dialog on the host document.
    pub fn message_box(&self, dialog: Dialog) {
        self.document.show_dialog(dialog);
    }

    /// Gracefully close every live window.
    pub async fn close_all_windows(&self) {
        for entry in self.handler.windowed_entries() {
            if let Some(window) = entry.windowed() {
                window.close_window().await;
            }
        }
    }

    /// Spawn a daemon for `username` under the renderer.
    pub async fn start_user_session(
        self: &Rc<Self>,
        username: &str,
    ) -> Result<Rc<UserDaemon>, SpawnError> {
        self.handler
            .spawn(USER_DAEMON_NAME, self.renderer_pid(), |info| {
                Ok(UserDaemon::new(info, username, self))
            })
            .await
    }

    // ========================================================================
    // Crash handling
    // ========================================================================

    /// Run `work` as a local task; its error or panic crashes the runtime.
    pub fn spawn_guarded<Fut>(self: &Rc<Self>, work: Fut)
    where
        Fut: Future<Output = Result<(), ScriptError>> + 'static,
    {
        let me = self.me.clone();
        let task = tokio::task::spawn_local(work);
        tokio::task::spawn_local(async move {
            let reason = match task.await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => CrashReason::from_error(e.as_ref()),
                Err(join) if join.is_panic() => CrashReason::from_panic(join.into_panic().as_ref()),
                Err(join) => CrashReason::new("Cancelled", join.to_string()),
            };
            if let Some(runtime) = me.upgrade() {
                runtime.crash(reason).await;
            }
        });
    }

    /// Latch the crash flag and show the crash state. Only the first call
    /// has any effect.
    pub async fn crash(self: &Rc<Self>, reason: CrashReason) {
        if self.crashing.get() {
            tracing::debug!("[supervisor] already crashing, ignoring {}", reason.message);
            return;
        }
        self.crashing.set(true);
        tracing::error!(
            "[supervisor] ### CRASH ### {}: {}",
            reason.kind,
            reason.message
        );

        if let Err(e) = self
            .load_state(CRASH, json!({ "reason": reason }), true)
            .await
        {
            tracing::error!("[supervisor] crash state failed to load: {}", e);
        }
    }
}
