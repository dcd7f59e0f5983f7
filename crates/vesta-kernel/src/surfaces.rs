use crate::types::ProcessId;

/// What the lifecycle manager needs from the surface synchronizer.
///
/// The handler holds the synchronizer weakly and calls [`sync`](Self::sync)
/// after every table mutation.
pub trait SurfaceSync {
    /// Reconcile rendered surfaces with the live process table.
    fn sync(&self);

    /// Pids of rendered, live instances of `app_id`, excluding `origin`.
    fn app_instances(&self, app_id: &str, origin: Option<ProcessId>) -> Vec<ProcessId>;

    /// Put the surface of `pid` into its closing state.
    ///
    /// Returns false when `pid` has no surface.
    fn mark_closing(&self, pid: ProcessId) -> bool;
}
