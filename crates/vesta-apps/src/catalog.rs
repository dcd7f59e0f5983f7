//! The application catalog.
//!
//! Applications are registered statically: a validated descriptor plus a
//! factory producing the [`App`] for each spawn. Registration copies the
//! descriptor into the `APPS` hive so other components can list installed
//! applications without touching the catalog.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use vesta_kernel::{AppDescriptor, ProcessHandler, ProcessId};
use vesta_registry::{Hive, Registry};

use crate::framework::{App, AppError, AppProcess, AppTimings};

/// Builds a fresh [`App`] from launch arguments.
pub type AppFactory = Rc<dyn Fn(&Value) -> Box<dyn App>>;

#[derive(Clone)]
struct CatalogEntry {
    descriptor: AppDescriptor,
    factory: AppFactory,
}

/// Registered applications, keyed by id.
pub struct AppCatalog {
    entries: RefCell<BTreeMap<String, CatalogEntry>>,
    registry: Rc<Registry>,
    /// Parent for spawns that name none (the surface synchronizer)
    default_parent: Cell<Option<ProcessId>>,
    timings: AppTimings,
}

impl AppCatalog {
    /// Create an empty catalog.
    pub fn new(registry: Rc<Registry>, timings: AppTimings) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            registry,
            default_parent: Cell::new(None),
            timings,
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Validate and register an application.
    ///
    /// Rejects invalid descriptors, ids that cannot be used as a registry key,
    /// and ids that are already registered.
    pub fn load_app<F>(&self, descriptor: AppDescriptor, factory: F) -> Result<(), AppError>
    where
        F: Fn(&Value) -> Box<dyn App> + 'static,
    {
        descriptor.validate()?;
        if descriptor.id.contains('.') {
            return Err(AppError::load(format!(
                "{}: application ids may not contain '.'",
                descriptor.id
            )));
        }
        if self.is_loaded(&descriptor.id) {
            return Err(AppError::load(format!(
                "{}: an application with this id is already loaded",
                descriptor.id
            )));
        }

        if let Err(e) = self
            .registry
            .set_value(Hive::Apps, &descriptor.id, &descriptor)
        {
            tracing::warn!("[apps] could not record {} in the registry: {}", descriptor.id, e);
        }
        tracing::info!("[apps] loaded {} ({})", descriptor.id, descriptor.metadata.name);

        self.entries.borrow_mut().insert(
            descriptor.id.clone(),
            CatalogEntry {
                descriptor,
                factory: Rc::new(factory),
            },
        );
        Ok(())
    }

    /// Validate a raw JSON descriptor and register it.
    pub fn load_app_json<F>(&self, raw: Value, factory: F) -> Result<(), AppError>
    where
        F: Fn(&Value) -> Box<dyn App> + 'static,
    {
        let descriptor = AppDescriptor::from_json(raw)?;
        self.load_app(descriptor, factory)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether `id` is registered.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.entries.borrow().contains_key(id)
    }

    /// A copy of the descriptor registered under `id`.
    pub fn descriptor(&self, id: &str) -> Option<AppDescriptor> {
        self.entries.borrow().get(id).map(|e| e.descriptor.clone())
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Ids of applications spawned when the desktop loads.
    pub fn startup_ids(&self) -> Vec<String> {
        self.entries
            .borrow()
            .values()
            .filter(|e| e.descriptor.core || e.descriptor.auto_run)
            .map(|e| e.descriptor.id.clone())
            .collect()
    }

    /// Set the parent used when a spawn names none.
    pub fn set_default_parent(&self, pid: Option<ProcessId>) {
        self.default_parent.set(pid);
    }

    /// Parent used when a spawn names none.
    pub fn default_parent(&self) -> Option<ProcessId> {
        self.default_parent.get()
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    /// Spawn a new windowed process for application `id`.
    pub async fn spawn_app(
        &self,
        handler: &Rc<ProcessHandler>,
        id: &str,
        parent: Option<ProcessId>,
        args: Value,
    ) -> Result<Rc<AppProcess>, AppError> {
        let entry = self
            .entries
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let parent = parent.or(self.default_parent.get());
        let timings = self.timings;

        let process = handler
            .spawn(id, parent, |info| {
                let app = (entry.factory)(&args);
                AppProcess::new(info, &entry.descriptor, args, app, handler, timings)
            })
            .await?;
        Ok(process)
    }
}
