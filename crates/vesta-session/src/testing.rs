//! In-memory host stage.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::error::StageError;
use crate::stage::Stage;

/// A [`Stage`] that records what it is told.
#[derive(Default)]
pub struct HeadlessStage {
    hidden: Cell<bool>,
    class: RefCell<Option<String>>,
    markup: RefCell<String>,
    stylesheet: RefCell<Option<String>>,
    slots: RefCell<BTreeMap<String, String>>,
    failing: RefCell<BTreeSet<String>>,
    events: RefCell<Vec<String>>,
}

impl HeadlessStage {
    /// An empty, visible stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make fetches of `resource` fail.
    pub fn fail_resource(&self, resource: impl Into<String>) {
        self.failing.borrow_mut().insert(resource.into());
    }

    /// Whether the container is hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    /// State class currently applied.
    pub fn mounted_class(&self) -> Option<String> {
        self.class.borrow().clone()
    }

    /// Markup currently mounted.
    pub fn markup(&self) -> String {
        self.markup.borrow().clone()
    }

    /// Active stylesheet.
    pub fn stylesheet(&self) -> Option<String> {
        self.stylesheet.borrow().clone()
    }

    /// Text of a slot.
    pub fn slot(&self, slot: &str) -> Option<String> {
        self.slots.borrow().get(slot).cloned()
    }

    /// Everything the stage was told, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    fn record(&self, event: String) {
        tracing::debug!("[stage] {}", event);
        self.events.borrow_mut().push(event);
    }
}

#[async_trait(?Send)]
impl Stage for HeadlessStage {
    fn set_hidden(&self, hidden: bool) {
        self.hidden.set(hidden);
        self.record(format!("hidden:{}", hidden));
    }

    async fn fetch_markup(&self, resource: &str) -> Result<String, StageError> {
        tokio::task::yield_now().await;
        if self.failing.borrow().contains(resource) {
            return Err(StageError::new(resource, "not found"));
        }
        Ok(format!("<main data-src=\"{}\"></main>", resource))
    }

    fn mount(&self, state_id: &str, previous: Option<&str>, markup: String) {
        if let Some(previous) = previous {
            self.record(format!("unmount:{}", previous));
        }
        *self.markup.borrow_mut() = markup;
        *self.class.borrow_mut() = Some(state_id.to_string());
        self.slots.borrow_mut().clear();
        self.record(format!("mount:{}", state_id));
    }

    fn set_stylesheet(&self, resource: &str) {
        *self.stylesheet.borrow_mut() = Some(resource.to_string());
        self.record(format!("style:{}", resource));
    }

    fn set_slot_text(&self, slot: &str, text: &str) {
        self.slots
            .borrow_mut()
            .insert(slot.to_string(), text.to_string());
        self.record(format!("slot:{}={}", slot, text));
    }
}
