//! Vesta session: the global state machine.
//!
//! The runtime is always in exactly one global state (boot, login, desktop
//! or crash). Each state names a markup bundle, a stylesheet and a behavior
//! script; [`SessionMachine::load_state`] swaps the [`Stage`] over to the
//! target and runs its script from the [`ScriptRegistry`].
//!
//! While the crash latch is set only the crash state can be entered.

mod error;
mod machine;
mod scripts;
mod stage;
pub mod states;
pub mod testing;

pub use error::{ScriptError, StageError, StateError};
pub use machine::{SessionMachine, SessionTimings, Transition};
pub use scripts::{ScriptFuture, ScriptRegistry, StateScript};
pub use stage::Stage;
pub use states::{script_key, StateDescriptor, StateTable, CRASH_STATE_ID};
