//! Context handed to node, exec and goto callables

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Arbitrary keyword data attached to a running menu
pub type Attributes = BTreeMap<String, Value>;

/// Keyword data delivered to a node along with a transition
pub type Kwargs = BTreeMap<String, Value>;

/// Stable identity of the acting entity (not the transport session)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Mutable view of a running menu, passed to user logic.
///
/// Node logic may read and write attributes and queue extra messages for the
/// entity. It never sees the registry or the state machine.
#[derive(Debug, Clone)]
pub struct NodeContext {
    entity: EntityId,
    node: String,
    attributes: Attributes,
    kwargs: Kwargs,
    outbox: Vec<String>,
}

impl NodeContext {
    pub fn new(entity: EntityId, attributes: Attributes) -> Self {
        Self {
            entity,
            node: String::new(),
            attributes,
            kwargs: Kwargs::new(),
            outbox: Vec::new(),
        }
    }

    /// The entity this menu belongs to
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// Name of the node currently being executed or displayed
    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// String attribute, or `None` if missing or not a string
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    pub fn kwarg(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }

    /// Queue a message for the entity; flushed before the next node text
    pub fn msg(&mut self, text: impl Into<String>) {
        self.outbox.push(text.into());
    }

    pub(crate) fn enter(&mut self, node: &str, kwargs: Kwargs) {
        node.clone_into(&mut self.node);
        self.kwargs = kwargs;
    }

    pub(crate) fn merge_attributes(&mut self, extra: &Kwargs) {
        for (key, value) in extra {
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }
}
