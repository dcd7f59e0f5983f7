//! The host stage contract.

use async_trait::async_trait;

use crate::error::StageError;

/// The container global states are mounted into.
#[async_trait(?Send)]
pub trait Stage {
    /// Hide or reveal the container.
    fn set_hidden(&self, hidden: bool);

    /// Fetch a markup resource.
    async fn fetch_markup(&self, resource: &str) -> Result<String, StageError>;

    /// Replace the container contents, swapping the state class from
    /// `previous` to `state_id`.
    fn mount(&self, state_id: &str, previous: Option<&str>, markup: String);

    /// Point the state stylesheet at `resource`.
    fn set_stylesheet(&self, resource: &str);

    /// Write text into a named slot of the mounted markup.
    fn set_slot_text(&self, slot: &str, text: &str);
}
