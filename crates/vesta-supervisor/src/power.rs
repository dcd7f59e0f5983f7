//! Power actions.
//!
//! Shutdown, restart and log off all close every window and return to the
//! login state, which reads the action from its props.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use vesta_session::states::LOGIN;
use vesta_session::{StateError, Transition};

use crate::runtime::Runtime;

/// A requested power action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    /// Turn the machine off
    Shutdown,
    /// Turn it off and boot again
    Restart,
    /// End the user session
    Logoff,
}

impl PowerAction {
    /// Value of the `type` prop handed to the login state.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::Shutdown => "shutdown",
            PowerAction::Restart => "restart",
            PowerAction::Logoff => "logout",
        }
    }
}

impl Runtime {
    /// Close every window and show the login state as shut down.
    pub async fn shutdown(self: &Rc<Self>) -> Result<Transition, StateError> {
        self.power_action(PowerAction::Shutdown).await
    }

    /// Close every window and show the login state as restarting.
    pub async fn restart(self: &Rc<Self>) -> Result<Transition, StateError> {
        self.power_action(PowerAction::Restart).await
    }

    /// Close every window and return to the login state.
    pub async fn logoff(self: &Rc<Self>) -> Result<Transition, StateError> {
        self.power_action(PowerAction::Logoff).await
    }

    async fn power_action(self: &Rc<Self>, action: PowerAction) -> Result<Transition, StateError> {
        tracing::info!("[power] {}", action.as_str());
        self.close_all_windows().await;
        self.power().set(Some(action));

        let instant = self.in_state(LOGIN);
        self.load_state(LOGIN, json!({ "type": action.as_str() }), instant)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_prop_values() {
        assert_eq!(PowerAction::Shutdown.as_str(), "shutdown");
        assert_eq!(PowerAction::Restart.as_str(), "restart");
        assert_eq!(PowerAction::Logoff.as_str(), "logout");
    }
}
