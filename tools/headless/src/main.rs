//! Headless Vesta runner
//!
//! Boots the runtime against an in-memory document and stage, lets it run
//! for a while, then prints the process table, the surfaces and any dialogs.
//!
//! Environment:
//! - `VESTA_LOG`: tracing filter (default `info`)
//! - `VESTA_RUN_SECS`: how long to run (default 10)
//!
//! Pass `--memory` to keep everything in memory instead of the local data
//! directory.

use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::LocalSet;
use tracing_subscriber::prelude::*;
use vesta_kernel::WindowedProcess;
use tracing_subscriber::{fmt, EnvFilter};
use vesta_apps::{App, AppError, AppProcess};
use vesta_desktop::testing::HeadlessDocument;
use vesta_kernel::AppDescriptor;
use vesta_session::testing::HeadlessStage;
use vesta_supervisor::constants::CRASH_SLOT;
use vesta_supervisor::{Host, LogBook, Runtime};
use vesta_vfs::{DiskVfs, MemoryVfs, StorageAdapter};

/// Greets the user once the desktop is up.
struct Welcome;

#[async_trait(?Send)]
impl App for Welcome {
    async fn render(&self, process: &AppProcess) -> Result<(), AppError> {
        if process.close_if_second_instance().await {
            return Ok(());
        }
        process.title().set(String::from("Welcome to Vesta"));
        tracing::info!("[welcome] PID={} rendered", process.pid());
        Ok(())
    }
}

fn welcome(_: &Value) -> Box<dyn App> {
    Box::new(Welcome)
}

fn storage() -> Result<Rc<dyn StorageAdapter>, String> {
    if std::env::args().any(|arg| arg == "--memory") {
        return Ok(Rc::new(MemoryVfs::new()));
    }
    let disk = DiskVfs::in_data_dir().map_err(|e| e.to_string())?;
    tracing::info!("[headless] storage at {}", disk.root().display());
    Ok(Rc::new(disk))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let logbook = LogBook::default();
    let filter = EnvFilter::try_from_env("VESTA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(filter))
        .with(logbook.clone())
        .init();

    let run_for = std::env::var("VESTA_RUN_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(10));

    let fs = match storage() {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("vesta-headless: cannot open storage: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let document = Rc::new(HeadlessDocument::new());
    let stage = Rc::new(HeadlessStage::new());
    let host = Host {
        fs,
        document: document.clone(),
        stage: stage.clone(),
        logbook,
    };

    LocalSet::new()
        .run_until(async move {
            let runtime = match Runtime::boot(host).await {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("vesta-headless: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = runtime.catalog().load_app(
                AppDescriptor::new("welcome", "Welcome").auto_run(),
                welcome,
            ) {
                eprintln!("vesta-headless: {}", e);
                return ExitCode::FAILURE;
            }

            tokio::time::sleep(run_for).await;

            println!();
            println!("state:     {}", runtime.session().current().get().unwrap_or_default());
            println!("crashing:  {}", runtime.is_crashing());
            println!("processes:");
            for entry in runtime.handler().live_entries() {
                let info = entry.info();
                println!(
                    "  {:>4}  {:<12} parent={:<6} windowed={}",
                    info.pid.0,
                    info.name,
                    info.parent.map(|p| p.0.to_string()).unwrap_or_default(),
                    entry.kind.is_windowed()
                );
            }
            println!("surfaces:");
            for pid in document.surfaces() {
                if let Some(surface) = document.surface(pid) {
                    println!("  {:>4}  {}", pid.0, surface.title);
                }
            }
            for dialog in document.dialogs() {
                println!("dialog:    {}: {}", dialog.title, dialog.message);
            }
            if let Some(report) = stage.slot(CRASH_SLOT) {
                println!("\n{}", report);
            }

            if runtime.is_crashing() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        })
        .await
}
