//! Menu session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, Resolution};
pub use state::{ExitReason, MenuContext, MenuState};
pub use transition::{transition, TransitionError, TransitionResult};
