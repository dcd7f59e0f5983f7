//! The session state machine.
//!
//! ```text
//!   load_state(target, props, instant)
//!     │
//!     ├─ crashing and target is not the crash state ──► Skipped
//!     ├─ record props for target.id
//!     ├─ [!instant] hide stage, wait exit delay
//!     ├─ fetch + mount markup (fatal on failure)
//!     ├─ swap stylesheet
//!     ├─ [!instant] wait enter delay, reveal stage
//!     ├─ current = target.id
//!     └─ run the behavior script (errors propagate)
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use serde_json::{Map, Value};
use vesta_cell::Observable;

use crate::error::StateError;
use crate::scripts::ScriptRegistry;
use crate::stage::Stage;
use crate::states::{StateDescriptor, CRASH_STATE_ID};

/// Transition pacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionTimings {
    /// Hidden time before the new markup is mounted
    pub exit_delay: Duration,
    /// Time after mounting before the stage is revealed
    pub enter_delay: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            exit_delay: Duration::from_millis(400),
            enter_delay: Duration::from_millis(500),
        }
    }
}

/// What `load_state` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The state was entered and its script ran
    Entered,
    /// The runtime is crashing and the target is not the crash state
    Skipped,
}

/// Drives transitions between global states.
///
/// `C` is the context handed to behavior scripts.
pub struct SessionMachine<C> {
    stage: Rc<dyn Stage>,
    scripts: ScriptRegistry<C>,
    /// Last props passed to a transition, by state id
    props: RefCell<BTreeMap<String, Value>>,
    /// Id of the active state
    current: Observable<Option<String>>,
    /// Global crash latch
    crashing: Observable<bool>,
    timings: SessionTimings,
}

impl<C: 'static> SessionMachine<C> {
    /// Create a machine with no active state.
    pub fn new(
        stage: Rc<dyn Stage>,
        scripts: ScriptRegistry<C>,
        crashing: Observable<bool>,
        timings: SessionTimings,
    ) -> Self {
        Self {
            stage,
            scripts,
            props: RefCell::new(BTreeMap::new()),
            current: Observable::new(None),
            crashing,
            timings,
        }
    }

    /// Enter `target`, then run its behavior script with `ctx`.
    pub async fn load_state(
        &self,
        target: &StateDescriptor,
        props: Value,
        instant: bool,
        ctx: C,
    ) -> Result<Transition, StateError> {
        if self.preempted(target) {
            return Ok(Transition::Skipped);
        }
        if let Some(field) = target.empty_field() {
            return Err(StateError::InvalidDescriptor { field });
        }

        tracing::info!("[session] loading state {} ({})", target.label, target.id);
        let props = if props.is_null() {
            Value::Object(Map::new())
        } else {
            props
        };
        self.props.borrow_mut().insert(target.id.clone(), props);

        if !instant {
            self.stage.set_hidden(true);
            tokio::time::sleep(self.timings.exit_delay).await;
            if self.preempted(target) {
                return Ok(Transition::Skipped);
            }
        }

        let markup = self
            .stage
            .fetch_markup(&target.markup)
            .await
            .map_err(|source| StateError::MissingResource {
                state: target.id.clone(),
                source,
            })?;
        let previous = self.current.get();
        self.stage.mount(&target.id, previous.as_deref(), markup);
        self.stage.set_stylesheet(&target.style);

        if !instant {
            tokio::time::sleep(self.timings.enter_delay).await;
            if self.preempted(target) {
                return Ok(Transition::Skipped);
            }
            self.stage.set_hidden(false);
        }

        self.current.set(Some(target.id.clone()));

        let entry = self
            .scripts
            .get(&target.script)
            .ok_or_else(|| StateError::MissingEntry {
                state: target.id.clone(),
                script: target.script.clone(),
            })?;
        tracing::debug!("[session] {}: starting script", target.id);
        entry(ctx).await.map_err(|source| StateError::Script {
            state: target.id.clone(),
            source,
        })?;

        Ok(Transition::Entered)
    }

    /// A crash latched while `target` was loading wins over it.
    fn preempted(&self, target: &StateDescriptor) -> bool {
        let preempted = self.crashing.get() && target.id != CRASH_STATE_ID;
        if preempted {
            tracing::warn!("[session] not loading {} while crashing", target.id);
        }
        preempted
    }

    /// Props of the last transition into `state_id` (an empty object when none).
    pub fn props_of(&self, state_id: &str) -> Value {
        self.props
            .borrow()
            .get(state_id)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// The active-state cell.
    pub fn current(&self) -> &Observable<Option<String>> {
        &self.current
    }

    /// Whether `state_id` is the active state.
    pub fn is_current(&self, state_id: &str) -> bool {
        self.current.with(|c| c.as_deref() == Some(state_id))
    }

    /// The stage states are mounted into.
    pub fn stage(&self) -> &Rc<dyn Stage> {
        &self.stage
    }

    /// The crash latch.
    pub fn crashing(&self) -> &Observable<bool> {
        &self.crashing
    }
}
