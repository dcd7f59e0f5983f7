//! Integration tests for the surface synchronizer.
//!
//! Real windowed processes from `vesta-apps`, rendered into a headless
//! document on a paused clock.

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::task::LocalSet;
use vesta_apps::{App, AppCatalog, AppError, AppProcess, AppTimings};
use vesta_cell::Observable;
use vesta_desktop::testing::HeadlessDocument;
use vesta_desktop::{DialogKind, Document, Renderer, RendererConfig, RendererError};
use vesta_kernel::testing::test_registry;
use vesta_kernel::{
    AppDescriptor, KillOutcome, Process, ProcessHandler, ProcessId, SpawnError, SurfaceSync,
    WindowedProcess,
};

/// App whose render behavior is picked by its launch arguments.
struct Scripted {
    mode: String,
}

#[async_trait(?Send)]
impl App for Scripted {
    async fn render(&self, process: &AppProcess) -> Result<(), AppError> {
        match self.mode.as_str() {
            "fail" => Err(AppError::runtime("render exploded")),
            "panic" => panic!("render panicked"),
            "crash-later" => {
                let click = process.safe(|_: ()| Err(AppError::runtime("click handler failed")));
                click(());
                Ok(())
            }
            "single" => {
                process.close_if_second_instance().await;
                Ok(())
            }
            "retitle" => {
                process.title().set(String::from("Renamed"));
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn scripted(args: &Value) -> Box<dyn App> {
    Box::new(Scripted {
        mode: args["mode"].as_str().unwrap_or("ok").to_string(),
    })
}

struct Desktop {
    document: Rc<HeadlessDocument>,
    handler: Rc<ProcessHandler>,
    renderer: Rc<Renderer>,
    catalog: AppCatalog,
}

impl Desktop {
    async fn boot() -> Self {
        Self::boot_with(Rc::new(HeadlessDocument::new())).await
    }

    async fn boot_with(document: Rc<HeadlessDocument>) -> Self {
        let registry = test_registry();
        let handler = ProcessHandler::new(Rc::clone(&registry), Observable::new(false));
        let renderer = Renderer::launch(
            &handler,
            None,
            document.clone(),
            &RendererConfig::default(),
        )
        .await
        .unwrap();

        let catalog = AppCatalog::new(registry, AppTimings::default());
        catalog.set_default_parent(Some(renderer.info().pid));
        catalog
            .load_app(AppDescriptor::new("notes", "Notes"), scripted)
            .unwrap();
        catalog
            .load_app(AppDescriptor::new("clock", "Clock"), scripted)
            .unwrap();

        Self {
            document,
            handler,
            renderer,
            catalog,
        }
    }

    async fn spawn(&self, id: &str, mode: &str) -> Rc<AppProcess> {
        self.catalog
            .spawn_app(&self.handler, id, None, json!({ "mode": mode }))
            .await
            .unwrap()
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(500)).await;
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_spawned_app_gets_one_focused_surface() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let app = desktop.spawn("notes", "ok").await;

            assert!(desktop.renderer.is_rendered(app.pid()));
            settle().await;

            let surface = desktop.document.surface(app.pid()).unwrap();
            assert_eq!(surface.app_id, "notes");
            assert_eq!(surface.title, "Notes");
            assert!(surface.geometry.is_some());
            assert_eq!(desktop.renderer.windows().focused().get(), Some(app.pid()));
            assert_eq!(desktop.document.loaded_bundles(), vec![app.pid()]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_sync_is_idempotent() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let app = desktop.spawn("notes", "ok").await;
            settle().await;

            for _ in 0..3 {
                desktop.renderer.sync();
            }
            settle().await;

            assert_eq!(desktop.document.insert_count(), 1);
            assert_eq!(desktop.document.surfaces(), vec![app.pid()]);
            assert_eq!(desktop.renderer.rendered_pids(), vec![app.pid()]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_title_changes_reach_the_surface() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let app = desktop.spawn("notes", "retitle").await;
            settle().await;

            assert_eq!(desktop.document.surface(app.pid()).unwrap().title, "Renamed");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_focus_moves_between_surfaces() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let a = desktop.spawn("notes", "ok").await;
            settle().await;
            let b = desktop.spawn("clock", "ok").await;
            settle().await;

            assert_eq!(desktop.renderer.windows().focused().get(), Some(b.pid()));
            desktop.renderer.windows().focus(a.pid());

            let za = desktop.document.surface(a.pid()).unwrap().z_index;
            let zb = desktop.document.surface(b.pid()).unwrap().z_index;
            assert!(za > zb);
        })
        .await;
}

// ============================================================================
// Crash isolation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_crash_kills_only_the_crashing_app() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let healthy = desktop.spawn("clock", "ok").await;
            let crashing = desktop.spawn("notes", "crash-later").await;
            settle().await;

            let dialogs = desktop.document.dialogs();
            assert_eq!(dialogs.len(), 1);
            assert_eq!(dialogs[0].kind, DialogKind::Error);
            assert_eq!(dialogs[0].title, "Notes - Application Error");
            assert!(dialogs[0].message.contains("notes"));
            assert!(dialogs[0].message.contains(&format!("PID {}", crashing.pid())));

            assert!(crashing.info().is_disposed());
            assert!(!healthy.info().is_disposed());
            assert_eq!(desktop.document.surfaces(), vec![healthy.pid()]);
            assert!(!desktop.renderer.is_rendered(crashing.pid()));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_render_failure_shows_dialog_and_kills() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let app = desktop.spawn("notes", "fail").await;
            settle().await;

            assert_eq!(desktop.document.dialogs().len(), 1);
            assert!(desktop.document.dialogs()[0]
                .message
                .contains("render exploded"));
            assert!(app.info().is_disposed());
            assert!(desktop.document.surfaces().is_empty());
            assert!(desktop.document.loaded_bundles().is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_render_panic_is_contained() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let healthy = desktop.spawn("clock", "ok").await;
            let app = desktop.spawn("notes", "panic").await;
            settle().await;

            let dialogs = desktop.document.dialogs();
            assert_eq!(dialogs.len(), 1);
            assert_eq!(dialogs[0].kind, DialogKind::Error);
            assert!(dialogs[0].message.contains("render panicked"));
            assert!(app.info().is_disposed());
            assert!(!healthy.info().is_disposed());
            assert_eq!(desktop.document.surfaces(), vec![healthy.pid()]);
            assert!(!desktop.renderer.is_rendered(app.pid()));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_bundle_failure_is_contained() {
    LocalSet::new()
        .run_until(async {
            let document = Rc::new(HeadlessDocument::new());
            document.fail_resource("apps/notes/style.css");
            let desktop = Desktop::boot_with(document).await;

            let broken = desktop.spawn("notes", "ok").await;
            let fine = desktop.spawn("clock", "ok").await;
            settle().await;

            assert!(broken.info().is_disposed());
            assert!(!fine.info().is_disposed());
            assert_eq!(desktop.document.dialogs().len(), 1);
            assert_eq!(desktop.document.surfaces(), vec![fine.pid()]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_disposed_before_render_gets_no_dialog() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let app = desktop.spawn("notes", "ok").await;

            assert_eq!(app.kill_self().await, KillOutcome::Success);
            settle().await;

            assert!(desktop.document.dialogs().is_empty());
            assert_eq!(desktop.document.insert_count(), 0);
            assert!(desktop.document.surfaces().is_empty());
            assert!(desktop.document.loaded_bundles().is_empty());
            assert!(desktop.renderer.rendered_pids().is_empty());
        })
        .await;
}

// ============================================================================
// Closing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_close_window_animates_then_removes() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let app = desktop.spawn("notes", "ok").await;
            settle().await;

            let closing = app.close_window();
            tokio::pin!(closing);
            tokio::select! {
                _ = &mut closing => panic!("closed without grace period"),
                _ = tokio::time::sleep(Duration::from_millis(100)) => {}
            }
            assert!(desktop.document.is_closing(app.pid()));
            assert!(desktop.document.surface(app.pid()).is_some());

            closing.await;
            assert!(app.info().is_disposed());
            assert!(desktop.document.surface(app.pid()).is_none());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_killing_renderer_requires_force() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let app = desktop.spawn("notes", "ok").await;
            settle().await;
            let pid = desktop.renderer.info().pid;

            assert_eq!(
                desktop.handler.kill(pid, false).await,
                KillOutcome::CriticalProcess
            );
            assert_eq!(desktop.handler.kill(pid, true).await, KillOutcome::Success);

            assert!(app.info().is_disposed());
            assert_eq!(desktop.renderer.try_sync(), Err(RendererError::Disposed));
        })
        .await;
}

// ============================================================================
// Single instance
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_two_single_instance_spawns_leave_one_surface() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            let first = desktop.spawn("notes", "single").await;
            let second = desktop.spawn("notes", "single").await;
            settle().await;

            assert!(!first.info().is_disposed());
            assert!(second.info().is_disposed());
            assert_eq!(desktop.document.surfaces(), vec![first.pid()]);
            assert_eq!(
                desktop.renderer.app_instances("notes", None),
                vec![first.pid()]
            );
        })
        .await;
}

// ============================================================================
// Construction
// ============================================================================

#[tokio::test]
async fn test_missing_render_target_fails_spawn() {
    let document = Rc::new(HeadlessDocument::new().without_render_target());
    let handler = ProcessHandler::new(test_registry(), Observable::new(false));

    let result = Renderer::launch(&handler, None, document, &RendererConfig::default()).await;

    assert!(matches!(result, Err(SpawnError::Build { .. })));
    assert!(handler.surfaces().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_core_app_is_fullscreen() {
    LocalSet::new()
        .run_until(async {
            let desktop = Desktop::boot().await;
            desktop
                .catalog
                .load_app(AppDescriptor::new("shell", "Shell").core(), scripted)
                .unwrap();
            let shell = desktop.spawn("shell", "ok").await;
            settle().await;

            assert_eq!(desktop.document.surface(shell.pid()).unwrap().geometry, None);
            assert_eq!(desktop.document.viewport().w, 1280.0);
            assert_eq!(shell.info().parent, Some(desktop.renderer.info().pid));
            assert!(desktop.handler.is_pid(ProcessId(shell.pid().0)));
        })
        .await;
}
