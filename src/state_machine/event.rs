//! Events that drive a menu session

use crate::context::Kwargs;
use crate::node::NodeId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Lifecycle events
    Start,
    Disconnect,
    Reconnect,
    ForceClose,
    TeardownComplete,

    // Input events
    Input {
        raw: String,
    },
    Resolved {
        resolution: Resolution,
    },

    // Node events
    NodeRendered {
        node: NodeId,
        input: String,
        kwargs: Kwargs,
        terminal: bool,
    },
    /// Unknown node, failing node/exec/goto logic, or a failed override
    /// install
    Failed {
        message: String,
    },
}

/// Outcome of matching one unit of input at the current node
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Enter `node` (may be the current node)
    Goto {
        node: NodeId,
        input: String,
        kwargs: Kwargs,
    },
    /// Re-run the current node with new input
    Rerun { input: String },
    /// The selected option leads nowhere
    Exit,
    /// Built-in quit command
    Quit,
    /// Built-in look command
    Look,
    /// Built-in help command
    Help,
    /// Nothing matched and there is no `_default` option
    NoMatch,
}
