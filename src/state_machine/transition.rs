//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result. Node execution and input matching happen in the runtime, which
//! reports back through [`Event::NodeRendered`] and [`Event::Resolved`].

use super::state::ExitReason;
use super::{Effect, Event, MenuContext, MenuState, Resolution};
use crate::context::Kwargs;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub new_state: MenuState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: MenuState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Move to `Exiting`: run `leading` effects, then tear down
    fn exiting(reason: ExitReason, leading: impl IntoIterator<Item = Effect>) -> Self {
        Self::new(MenuState::Exiting { reason })
            .with_effects(leading)
            .with_effect(Effect::Teardown)
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Menu is closed")]
    Closed,
    #[error("Menu is suspended")]
    Suspended,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &MenuState,
    context: &MenuContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let config = &context.config;

    match (state, event) {
        // ============================================================
        // Entering
        // ============================================================
        (MenuState::Entering, Event::Start) => Ok(TransitionResult::new(MenuState::Entering)
            .with_effect(Effect::InstallOverride)
            .with_effect(Effect::run_node(
                config.start_node.clone(),
                config.start_node_input.clone(),
                Kwargs::new(),
            ))),

        // ============================================================
        // Node results
        // ============================================================

        // Interactive node -> Active at that node
        (
            MenuState::Entering | MenuState::Active { .. },
            Event::NodeRendered {
                node,
                input,
                kwargs,
                terminal: false,
            },
        ) => {
            let result = TransitionResult::new(MenuState::Active {
                node,
                input,
                kwargs,
            })
            .with_effect(Effect::PresentNode);
            if config.persistent {
                Ok(result.with_effect(Effect::PersistState))
            } else {
                Ok(result)
            }
        }

        // Terminal node -> show it, then exit
        (
            MenuState::Entering | MenuState::Active { .. },
            Event::NodeRendered { terminal: true, .. },
        ) => Ok(TransitionResult::exiting(
            ExitReason::TerminalNode,
            [Effect::PresentNode],
        )),

        // Anything fatal to the transition -> report and exit
        (MenuState::Entering | MenuState::Active { .. }, Event::Failed { message }) => Ok(
            TransitionResult::exiting(ExitReason::Error, [Effect::present_error(message)]),
        ),

        // ============================================================
        // Input handling
        // ============================================================
        (MenuState::Active { .. }, Event::Input { raw }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::ResolveInput { raw }))
        }

        (MenuState::Active { .. }, Event::Resolved { resolution }) => match resolution {
            Resolution::Goto {
                node,
                input,
                kwargs,
            } => Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::run_node(node, input, kwargs))),
            Resolution::Rerun { input } => {
                let MenuState::Active { node, kwargs, .. } = state else {
                    unreachable!("matched Active above")
                };
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::run_node(
                    node.clone(),
                    input,
                    kwargs.clone(),
                )))
            }
            Resolution::Exit => Ok(TransitionResult::exiting(ExitReason::ExitOption, [])),
            Resolution::Quit => Ok(TransitionResult::exiting(ExitReason::Quit, [])),
            // A failed match re-presents the node unchanged
            Resolution::Look | Resolution::NoMatch => {
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::PresentNode))
            }
            Resolution::Help => {
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::PresentHelp))
            }
        },

        // ============================================================
        // Transport events
        // ============================================================

        // Persistent menu loses its transport -> save and detach
        (
            MenuState::Active {
                node,
                input,
                kwargs,
            },
            Event::Disconnect,
        ) if config.persistent => Ok(TransitionResult::new(MenuState::Suspended {
            node: node.clone(),
            input: input.clone(),
            kwargs: kwargs.clone(),
        })
        .with_effect(Effect::PersistState)
        .with_effect(Effect::DetachOverride)),

        (MenuState::Entering | MenuState::Active { .. }, Event::Disconnect) => Ok(
            TransitionResult::exiting(ExitReason::Disconnected, []),
        ),

        (MenuState::Suspended { .. }, Event::Disconnect) => {
            Ok(TransitionResult::new(state.clone()))
        }

        // Resume re-runs the saved node so dynamic nodes render fresh
        (
            MenuState::Suspended {
                node,
                input,
                kwargs,
            },
            Event::Reconnect,
        ) => Ok(TransitionResult::new(MenuState::Entering)
            .with_effect(Effect::InstallOverride)
            .with_effect(Effect::run_node(node.clone(), input.clone(), kwargs.clone()))),

        (MenuState::Active { .. }, Event::Reconnect) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::PresentNode))
        }

        // ============================================================
        // Closing
        // ============================================================

        // Teardown already triggered: repeated closes are no-ops
        (MenuState::Exiting { .. } | MenuState::Closed { .. }, Event::ForceClose) => {
            Ok(TransitionResult::new(state.clone()))
        }

        (_, Event::ForceClose) => Ok(TransitionResult::exiting(ExitReason::ForceClosed, [])),

        (MenuState::Exiting { reason }, Event::TeardownComplete) => {
            Ok(TransitionResult::new(MenuState::Closed { reason: *reason }))
        }

        // ============================================================
        // Rejections
        // ============================================================
        (MenuState::Exiting { .. } | MenuState::Closed { .. }, _) => Err(TransitionError::Closed),

        (MenuState::Suspended { .. }, _) => Err(TransitionError::Suspended),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {}",
            state.name()
        ))),
    }
}
