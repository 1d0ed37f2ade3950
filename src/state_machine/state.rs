//! Menu session state types

use crate::config::MenuConfig;
use crate::context::{EntityId, Kwargs};
use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Why a menu left the active state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Reached a node without options
    TerminalNode,
    /// Selected an option that leads nowhere
    ExitOption,
    /// Used the built-in quit command
    Quit,
    /// Unknown node or failing node logic
    Error,
    /// Transport dropped a non-persistent menu
    Disconnected,
    /// Closed from outside the menu
    ForceClosed,
}

/// Menu session state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuState {
    /// Override being installed, start node not yet displayed
    #[default]
    Entering,

    /// Waiting for input at `node`
    Active {
        node: NodeId,
        /// The input that led to this node
        input: String,
        kwargs: Kwargs,
    },

    /// Persistent menu whose entity disconnected
    Suspended {
        node: NodeId,
        input: String,
        kwargs: Kwargs,
    },

    /// Teardown in progress
    Exiting { reason: ExitReason },

    /// Torn down; accepts nothing further
    Closed { reason: ExitReason },
}

impl MenuState {
    pub fn is_active(&self) -> bool {
        matches!(self, MenuState::Active { .. })
    }

    /// Exiting or closed: teardown has been triggered
    pub fn is_finished(&self) -> bool {
        matches!(self, MenuState::Exiting { .. } | MenuState::Closed { .. })
    }

    pub fn current_node(&self) -> Option<&str> {
        match self {
            MenuState::Active { node, .. } | MenuState::Suspended { node, .. } => Some(node),
            _ => None,
        }
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        match self {
            MenuState::Exiting { reason } | MenuState::Closed { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            MenuState::Entering => "entering",
            MenuState::Active { .. } => "active",
            MenuState::Suspended { .. } => "suspended",
            MenuState::Exiting { .. } => "exiting",
            MenuState::Closed { .. } => "closed",
        }
    }
}

/// Immutable configuration of one menu session
#[derive(Debug, Clone)]
pub struct MenuContext {
    pub entity: EntityId,
    /// Catalog name of the menu tree
    pub menu: String,
    pub config: MenuConfig,
}

impl MenuContext {
    pub fn new(entity: EntityId, menu: impl Into<String>, config: MenuConfig) -> Self {
        Self {
            entity,
            menu: menu.into(),
            config,
        }
    }
}
