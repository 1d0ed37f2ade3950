//! Menu engine - conversational menus over a text session
//!
//! A per-entity state machine that presents node text and a set of
//! options, resolves raw input against those options and walks the menu
//! tree until a terminal node is reached. Menus may survive the entity's
//! transport disconnecting and reconnecting.
//!
//! The engine itself is transport-agnostic: output, the command layer that
//! is overridden while a menu is open, and durable storage are injected
//! through the traits in [`runtime`].

pub mod config;
pub mod context;
pub mod db;
pub mod demo;
pub mod error;
pub mod lifecycle;
pub mod node;
pub mod options;
pub mod runtime;
pub mod state_machine;

pub use config::{MenuConfig, MergeType};
pub use context::{Attributes, EntityId, Kwargs, NodeContext};
pub use error::MenuError;
pub use node::registry::{NodeModule, NodeNamespace, NodeRegistry};
pub use node::{IntoNodeFn, NodeError, NodeFn, NodeId, NodeOptions, NodeOutput};
pub use options::{Exec, Goto, Jump, OptionKey, OptionSpec};
pub use runtime::{MenuManager, MenuSession};
