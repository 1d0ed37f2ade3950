//! Menu error types

use crate::context::EntityId;
use crate::node::NodeId;
use crate::state_machine::transition::TransitionError;
use thiserror::Error;

/// Errors surfaced by the menu engine
#[derive(Debug, Error)]
pub enum MenuError {
    /// A start node or goto target does not resolve in the registry
    #[error("Menu node '{0}' is not implemented")]
    UnknownNode(NodeId),

    /// Input matched no option and the node has no `_default` option
    #[error("No option matches '{0}'")]
    NoMatch(String),

    /// Node, exec or goto logic returned an error
    #[error("Error in menu node '{node}': {message}")]
    NodeFailed { node: NodeId, message: String },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Menu is closed")]
    Closed,

    #[error("Menu is suspended until the entity reconnects")]
    Suspended,

    #[error("Menu store error: {0}")]
    Store(String),

    #[error("Command layer error: {0}")]
    CommandLayer(String),

    #[error("Unknown menu: {0}")]
    UnknownMenu(String),

    #[error("Entity {0} already has an active menu")]
    AlreadyActive(EntityId),

    #[error("Entity {0} has no active menu")]
    NoSession(EntityId),
}

impl From<TransitionError> for MenuError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Closed => MenuError::Closed,
            TransitionError::Suspended => MenuError::Suspended,
            TransitionError::InvalidTransition(msg) => MenuError::InvalidTransition(msg),
        }
    }
}
