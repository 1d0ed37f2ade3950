//! Effects produced by state transitions

use crate::context::Kwargs;
use crate::node::NodeId;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Install the menu's command override for the entity
    InstallOverride,

    /// Remove the override without running exit behavior (suspend)
    DetachOverride,

    /// Execute a node and make it the displayed node
    RunNode {
        node: NodeId,
        input: String,
        kwargs: Kwargs,
    },

    /// Match raw input against the displayed options
    ResolveInput { raw: String },

    /// Send the displayed node's text
    PresentNode,

    /// Send the displayed node's help text
    PresentHelp,

    /// Send an error message
    PresentError { message: String },

    /// Save a snapshot of the session (persistent menus)
    PersistState,

    /// Remove the override, clear saved state, run the exit command
    Teardown,
}

impl Effect {
    pub fn run_node(node: impl Into<NodeId>, input: impl Into<String>, kwargs: Kwargs) -> Self {
        Effect::RunNode {
            node: node.into(),
            input: input.into(),
            kwargs,
        }
    }

    pub fn present_error(message: impl Into<String>) -> Self {
        Effect::PresentError {
            message: message.into(),
        }
    }
}
