//! The process table and lifecycle manager.
//!
//! The table is an [`Observable`] so other components can watch it; a
//! subscription mirrors every published snapshot into the registry under
//! `KERNEL.processHandler.store`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::{json, Map, Value};
use vesta_cell::Observable;
use vesta_registry::{now_millis, Hive, Registry};

use crate::error::{ProcessError, SpawnError};
use crate::process::{Process, WindowedProcess};
use crate::surfaces::SurfaceSync;
use crate::types::{KillOutcome, ProcessEntry, ProcessId, ProcessInfo, ProcessKind, ProcessTable};
use crate::LocalBoxFuture;

/// Owns the process table.
pub struct ProcessHandler {
    /// Process table, disposed entries included
    table: Observable<ProcessTable>,
    /// Last allocated pid value
    last_pid: Cell<u64>,
    /// Config store for bookkeeping mirrors
    registry: Rc<Registry>,
    /// Global crash latch; spawns are refused while set
    crashing: Observable<bool>,
    /// Attached surface synchronizer
    surfaces: RefCell<Option<Weak<dyn SurfaceSync>>>,
}

impl ProcessHandler {
    /// Create an empty handler.
    pub fn new(registry: Rc<Registry>, crashing: Observable<bool>) -> Rc<Self> {
        let table: Observable<ProcessTable> = Observable::default();

        let mirror_registry = Rc::clone(&registry);
        table.subscribe(move |table: &ProcessTable| {
            let snapshot: Map<String, Value> = table
                .iter()
                .map(|(pid, entry)| {
                    let info = entry.info();
                    (
                        format!("#{}", pid),
                        json!({
                            "pid": pid.0,
                            "name": info.name,
                            "parent": info.parent.map(|p| p.0),
                            "disposed": info.is_disposed(),
                        }),
                    )
                })
                .collect();
            if let Err(e) =
                mirror_registry.set_value(Hive::Kernel, "processHandler.store", snapshot)
            {
                tracing::warn!("[kernel] process table mirror failed: {}", e);
            }
        });

        if let Err(e) = registry.set_value(
            Hive::Kernel,
            "loadTime.processHandler.absolute",
            now_millis(),
        ) {
            tracing::warn!("[kernel] bookkeeping failed: {}", e);
        }

        tracing::info!("[kernel] process handler ready");
        Rc::new(Self {
            table,
            last_pid: Cell::new(0),
            registry,
            crashing,
            surfaces: RefCell::new(None),
        })
    }

    /// Generate the next process ID.
    fn alloc_pid(&self) -> ProcessId {
        let pid = self.last_pid.get() + 1;
        self.last_pid.set(pid);
        if let Err(e) = self
            .registry
            .set_value(Hive::Kernel, "processHandler.lastPid", pid)
        {
            tracing::warn!("[kernel] lastPid bookkeeping failed: {}", e);
        }
        ProcessId(pid)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Allocate a pid, build and start a process, and insert it.
    ///
    /// `build` receives the process bookkeeping. A failing `start()` aborts
    /// the spawn; the pid is still consumed.
    pub async fn spawn<P, F>(
        &self,
        name: &str,
        parent: Option<ProcessId>,
        build: F,
    ) -> Result<Rc<P>, SpawnError>
    where
        P: Process,
        F: FnOnce(ProcessInfo) -> Result<Rc<P>, ProcessError>,
    {
        if self.crashing.get() {
            tracing::warn!("[kernel] refusing to spawn {} while crashing", name);
            return Err(SpawnError::Crashing {
                name: name.to_string(),
            });
        }

        let pid = self.alloc_pid();
        let process = build(ProcessInfo::new(pid, parent, name)).map_err(|source| {
            SpawnError::Build {
                name: name.to_string(),
                source,
            }
        })?;

        if let Err(source) = process.start().await {
            tracing::info!("[kernel] {} (pid {}) declined to start: {}", name, pid, source);
            return Err(SpawnError::StartRefused {
                name: name.to_string(),
                source,
            });
        }

        let kind = match Rc::clone(&process).windowed() {
            Some(windowed) => ProcessKind::Windowed(windowed),
            None => ProcessKind::Service,
        };
        let entry = ProcessEntry {
            process: Rc::clone(&process) as Rc<dyn Process>,
            kind,
        };
        tracing::debug!(
            "[kernel] spawned {} pid={} parent={:?} windowed={}",
            name,
            pid,
            parent.map(|p| p.0),
            entry.kind.is_windowed()
        );
        self.table.update(|table| {
            table.insert(pid, entry);
        });
        self.sync_surfaces();

        Ok(process)
    }

    /// Terminate a process and, depth-first, its children.
    ///
    /// Windowed children get a graceful `close_window` (which may veto);
    /// other children are killed with the same `force`. A forced cascade
    /// also kills critical windowed children the graceful close left alive.
    pub fn kill(&self, pid: ProcessId, force: bool) -> LocalBoxFuture<'_, KillOutcome> {
        Box::pin(async move {
            let Some(entry) = self.entry(pid) else {
                return KillOutcome::NoSuchProcess;
            };
            let info = entry.info();

            if info.is_critical() && !force {
                tracing::warn!("[kernel] refusing to kill critical process {} ({})", pid, info.name);
                return KillOutcome::CriticalProcess;
            }

            if let Err(e) = entry.process.stop().await {
                tracing::warn!("[kernel] {} (pid {}) stop failed: {}", info.name, pid, e);
            }

            self.kill_sub_processes(pid, force).await;

            info.mark_disposed();
            self.publish();
            tracing::debug!("[kernel] killed {} pid={}", info.name, pid);
            self.sync_surfaces();

            KillOutcome::Success
        })
    }

    async fn kill_sub_processes(&self, parent: ProcessId, force: bool) {
        for child in self.sub_process_entries(parent) {
            if child.info().is_disposed() {
                continue;
            }
            match &child.kind {
                ProcessKind::Windowed(window) => {
                    window.close_window().await;
                    // close_window ends in a non-forced kill
                    if force && child.info().is_critical() && !child.info().is_disposed() {
                        self.kill(child.info().pid, true).await;
                    }
                }
                ProcessKind::Service => {
                    let outcome = self.kill(child.info().pid, force).await;
                    if !outcome.is_success() {
                        tracing::debug!(
                            "[kernel] cascade from {} left {} alive: {:?}",
                            parent,
                            child.info().pid,
                            outcome
                        );
                    }
                }
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn entry(&self, pid: ProcessId) -> Option<ProcessEntry> {
        self.table.with(|table| {
            table
                .get(&pid)
                .filter(|e| !e.info().is_disposed())
                .cloned()
        })
    }

    /// A live process by pid.
    pub fn get_process(&self, pid: ProcessId) -> Option<Rc<dyn Process>> {
        self.entry(pid).map(|e| e.process)
    }

    /// A live process together with its kind.
    pub fn get_entry(&self, pid: ProcessId) -> Option<ProcessEntry> {
        self.entry(pid)
    }

    /// Whether `pid` names a live process.
    pub fn is_pid(&self, pid: ProcessId) -> bool {
        self.entry(pid).is_some()
    }

    fn sub_process_entries(&self, parent: ProcessId) -> Vec<ProcessEntry> {
        if !self.is_pid(parent) {
            return Vec::new();
        }
        self.table.with(|table| {
            table
                .values()
                .filter(|e| e.info().parent == Some(parent) && !e.info().is_disposed())
                .cloned()
                .collect()
        })
    }

    /// Live children of a live parent.
    pub fn get_sub_processes(&self, parent: ProcessId) -> Vec<Rc<dyn Process>> {
        self.sub_process_entries(parent)
            .into_iter()
            .map(|e| e.process)
            .collect()
    }

    /// Every live process, in pid order.
    pub fn live_entries(&self) -> Vec<ProcessEntry> {
        self.table.with(|table| {
            table
                .values()
                .filter(|e| !e.info().is_disposed())
                .cloned()
                .collect()
        })
    }

    /// Every live windowed process, in pid order.
    pub fn windowed_entries(&self) -> Vec<ProcessEntry> {
        self.live_entries()
            .into_iter()
            .filter(|e| e.kind.is_windowed())
            .collect()
    }

    /// The table cell (disposed entries included).
    pub fn table(&self) -> &Observable<ProcessTable> {
        &self.table
    }

    /// Highest pid handed out so far.
    pub fn last_pid(&self) -> ProcessId {
        ProcessId(self.last_pid.get())
    }

    /// The registry this handler mirrors into.
    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// The global crash latch.
    pub fn crashing(&self) -> &Observable<bool> {
        &self.crashing
    }

    // ========================================================================
    // Surface synchronizer
    // ========================================================================

    /// Attach the surface synchronizer and run an initial pass.
    pub fn attach_surfaces(&self, surfaces: &Rc<dyn SurfaceSync>) {
        *self.surfaces.borrow_mut() = Some(Rc::downgrade(surfaces));
        if let Err(e) = self.registry.set_value(
            Hive::Kernel,
            "loadTime.processHandler.startRenderer",
            now_millis(),
        ) {
            tracing::warn!("[kernel] bookkeeping failed: {}", e);
        }
        surfaces.sync();
    }

    /// The attached synchronizer, if still alive.
    pub fn surfaces(&self) -> Option<Rc<dyn SurfaceSync>> {
        self.surfaces.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn sync_surfaces(&self) {
        if let Some(surfaces) = self.surfaces() {
            surfaces.sync();
        }
    }

    fn publish(&self) {
        self.table.update(|_| {});
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_registry, EventLog, ScriptedProcess};

    fn handler() -> Rc<ProcessHandler> {
        ProcessHandler::new(test_registry(), Observable::new(false))
    }

    async fn spawn(
        handler: &ProcessHandler,
        name: &str,
        parent: Option<ProcessId>,
        log: &EventLog,
    ) -> Rc<ScriptedProcess> {
        handler
            .spawn(name, parent, |info| Ok(ScriptedProcess::new(info, log)))
            .await
            .unwrap()
    }

    // ========================================================================
    // PID allocation
    // ========================================================================

    #[tokio::test]
    async fn test_pids_are_unique_and_monotonic() {
        let handler = handler();
        let log = EventLog::default();

        let a = spawn(&handler, "a", None, &log).await;
        let b = spawn(&handler, "b", None, &log).await;
        handler.kill(a.info().pid, false).await;
        let c = spawn(&handler, "c", None, &log).await;

        assert_eq!(a.info().pid, ProcessId(1));
        assert_eq!(b.info().pid, ProcessId(2));
        assert_eq!(c.info().pid, ProcessId(3));
        assert_eq!(handler.last_pid(), ProcessId(3));
        assert_eq!(
            handler
                .registry()
                .get_value(Hive::Kernel, "processHandler.lastPid"),
            Some(json!(3))
        );
    }

    #[tokio::test]
    async fn test_refused_start_consumes_pid_but_not_table() {
        let handler = handler();
        let log = EventLog::default();

        let result = handler
            .spawn("shy", None, |info| {
                Ok(ScriptedProcess::new(info, &log).refusing_start())
            })
            .await;

        assert!(matches!(result, Err(SpawnError::StartRefused { .. })));
        assert!(handler.get_process(ProcessId(1)).is_none());
        assert!(handler.table().with(|t| t.is_empty()));

        let next = spawn(&handler, "next", None, &log).await;
        assert_eq!(next.info().pid, ProcessId(2));
    }

    #[tokio::test]
    async fn test_spawn_refused_while_crashing() {
        let handler = handler();
        handler.crashing().set(true);

        let result = handler
            .spawn("late", None, |info| Ok(ScriptedProcess::new(info, &EventLog::default())))
            .await;

        assert!(matches!(result, Err(SpawnError::Crashing { .. })));
        assert_eq!(handler.last_pid(), ProcessId(0));
    }

    #[tokio::test]
    async fn test_build_failure() {
        let handler = handler();

        let result = handler
            .spawn::<ScriptedProcess, _>("broken", None, |_| Err(ProcessError::failed("nope")))
            .await;

        assert!(matches!(result, Err(SpawnError::Build { .. })));
    }

    // ========================================================================
    // Kill
    // ========================================================================

    #[tokio::test]
    async fn test_kill_unknown_pid() {
        let handler = handler();
        assert_eq!(
            handler.kill(ProcessId(99), false).await,
            KillOutcome::NoSuchProcess
        );
    }

    #[tokio::test]
    async fn test_kill_twice() {
        let handler = handler();
        let p = spawn(&handler, "p", None, &EventLog::default()).await;

        assert_eq!(handler.kill(p.info().pid, false).await, KillOutcome::Success);
        assert_eq!(
            handler.kill(p.info().pid, false).await,
            KillOutcome::NoSuchProcess
        );
    }

    #[tokio::test]
    async fn test_critical_refusal_and_force() {
        let handler = handler();
        let log = EventLog::default();
        let init = handler
            .spawn("init", None, |info| {
                Ok(ScriptedProcess::new(info.critical(), &log))
            })
            .await
            .unwrap();
        let pid = init.info().pid;

        assert_eq!(handler.kill(pid, false).await, KillOutcome::CriticalProcess);
        assert!(handler.is_pid(pid));
        assert!(!log.contains("init:stop"));

        assert_eq!(handler.kill(pid, true).await, KillOutcome::Success);
        assert!(!handler.is_pid(pid));
    }

    #[tokio::test]
    async fn test_kill_cascades_depth_first() {
        let handler = handler();
        let log = EventLog::default();
        let p = spawn(&handler, "p", None, &log).await;
        let c1 = spawn(&handler, "c1", Some(p.info().pid), &log).await;
        let c2 = spawn(&handler, "c2", Some(p.info().pid), &log).await;
        let g = spawn(&handler, "g", Some(c1.info().pid), &log).await;

        assert_eq!(handler.kill(p.info().pid, false).await, KillOutcome::Success);

        for proc in [&p, &c1, &c2, &g] {
            assert!(proc.info().is_disposed());
            assert!(handler.get_process(proc.info().pid).is_none());
        }
        assert_eq!(log.events(), vec!["p:stop", "c1:stop", "g:stop", "c2:stop"]);
    }

    #[tokio::test]
    async fn test_cascade_honors_child_critical_unless_forced() {
        let handler = handler();
        let log = EventLog::default();
        let p = spawn(&handler, "p", None, &log).await;
        let guard = handler
            .spawn("guard", Some(p.info().pid), |info| {
                Ok(ScriptedProcess::new(info.critical(), &log))
            })
            .await
            .unwrap();

        handler.kill(p.info().pid, false).await;
        assert!(!guard.info().is_disposed());

        let q = spawn(&handler, "q", None, &log).await;
        let guard2 = handler
            .spawn("guard2", Some(q.info().pid), |info| {
                Ok(ScriptedProcess::new(info.critical(), &log))
            })
            .await
            .unwrap();
        handler.kill(q.info().pid, true).await;
        assert!(guard2.info().is_disposed());
    }

    #[tokio::test]
    async fn test_stop_failure_does_not_block_kill() {
        let handler = handler();
        let p = handler
            .spawn("grumpy", None, |info| {
                Ok(ScriptedProcess::new(info, &EventLog::default()).failing_stop())
            })
            .await
            .unwrap();

        assert_eq!(handler.kill(p.info().pid, false).await, KillOutcome::Success);
        assert!(p.info().is_disposed());
    }

    // ========================================================================
    // Queries and mirror
    // ========================================================================

    #[tokio::test]
    async fn test_sub_processes() {
        let handler = handler();
        let log = EventLog::default();
        let p = spawn(&handler, "p", None, &log).await;
        let c = spawn(&handler, "c", Some(p.info().pid), &log).await;
        spawn(&handler, "other", None, &log).await;

        let subs = handler.get_sub_processes(p.info().pid);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].info().pid, c.info().pid);

        handler.kill(c.info().pid, false).await;
        assert!(handler.get_sub_processes(p.info().pid).is_empty());
        assert!(handler.get_sub_processes(ProcessId(42)).is_empty());
    }

    #[tokio::test]
    async fn test_table_mirrored_into_registry() {
        let handler = handler();
        let log = EventLog::default();
        let p = spawn(&handler, "p", None, &log).await;
        spawn(&handler, "c", Some(p.info().pid), &log).await;

        let store = handler
            .registry()
            .get_value(Hive::Kernel, "processHandler.store")
            .unwrap();
        assert_eq!(store["#2"]["parent"], json!(1));
        assert_eq!(store["#2"]["name"], json!("c"));
        assert_eq!(store["#1"]["disposed"], json!(false));

        handler.kill(p.info().pid, false).await;
        let store = handler
            .registry()
            .get_value(Hive::Kernel, "processHandler.store")
            .unwrap();
        assert_eq!(store["#1"]["disposed"], json!(true));
        assert_eq!(store["#2"]["disposed"], json!(true));
    }

    #[tokio::test]
    async fn test_disposed_entries_stay_in_table() {
        let handler = handler();
        let p = spawn(&handler, "p", None, &EventLog::default()).await;

        handler.kill(p.info().pid, false).await;

        assert!(handler.table().with(|t| t.contains_key(&p.info().pid)));
        assert!(handler.live_entries().is_empty());
    }
}
