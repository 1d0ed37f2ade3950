//! Menu construction options

use crate::context::Attributes;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the menu's command override composes with the entity's standing
/// commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeType {
    /// Only the override's commands are available
    #[default]
    Replace,
    /// Both sets; the override wins on name clashes
    Union,
    /// Only commands present in both sets
    Intersect,
    /// Standing commands minus the override's commands
    Remove,
}

/// Configuration supplied when a menu is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    pub start_node: NodeId,
    #[serde(default)]
    pub merge_type: MergeType,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub auto_quit: bool,
    #[serde(default = "default_true")]
    pub auto_look: bool,
    #[serde(default = "default_true")]
    pub auto_help: bool,
    /// Command run against the entity once the menu exits
    #[serde(default = "default_exit_command")]
    pub exit_command: Option<String>,
    #[serde(default)]
    pub persistent: bool,
    /// Input fed to the start node before it is first displayed
    #[serde(default)]
    pub start_node_input: String,
    /// Append a listing of option keys and descriptions to node text
    #[serde(default = "default_true")]
    pub list_options: bool,
    /// Arbitrary keyword attributes exposed to node logic
    #[serde(default)]
    pub attributes: Attributes,
}

fn default_priority() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

#[allow(clippy::unnecessary_wraps)] // serde default must match the field type
fn default_exit_command() -> Option<String> {
    Some("look".to_string())
}

impl MenuConfig {
    pub fn new(start_node: impl Into<NodeId>) -> Self {
        Self {
            start_node: start_node.into(),
            merge_type: MergeType::default(),
            priority: default_priority(),
            auto_quit: true,
            auto_look: true,
            auto_help: true,
            exit_command: default_exit_command(),
            persistent: false,
            start_node_input: String::new(),
            list_options: true,
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn merge_type(mut self, merge_type: MergeType) -> Self {
        self.merge_type = merge_type;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn auto_quit(mut self, enabled: bool) -> Self {
        self.auto_quit = enabled;
        self
    }

    #[must_use]
    pub fn auto_look(mut self, enabled: bool) -> Self {
        self.auto_look = enabled;
        self
    }

    #[must_use]
    pub fn auto_help(mut self, enabled: bool) -> Self {
        self.auto_help = enabled;
        self
    }

    #[must_use]
    pub fn exit_command(mut self, command: Option<&str>) -> Self {
        self.exit_command = command.map(String::from);
        self
    }

    #[must_use]
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    #[must_use]
    pub fn start_node_input(mut self, input: impl Into<String>) -> Self {
        self.start_node_input = input.into();
        self
    }

    #[must_use]
    pub fn list_options(mut self, enabled: bool) -> Self {
        self.list_options = enabled;
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
