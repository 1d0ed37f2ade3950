//! Node lookup
//!
//! Nodes come from an explicit id → callable map and from any number of
//! namespaces that index ordinary functions by name. Lookups are never
//! cached; a namespace may be live.

use super::{IntoNodeFn, NodeFn, NodeId};
use crate::error::MenuError;
use std::collections::HashMap;
use std::sync::Arc;

/// A named collection of node callables
pub trait NodeNamespace: Send + Sync {
    fn get(&self, name: &str) -> Option<NodeFn>;

    fn names(&self) -> Vec<String>;
}

/// Plain-function namespace, usually built with [`node_module!`](crate::node_module)
#[derive(Debug, Clone, Default)]
pub struct NodeModule {
    nodes: HashMap<String, NodeFn>,
}

impl NodeModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<M>(&mut self, name: impl Into<String>, node: impl IntoNodeFn<M>) {
        self.nodes.insert(name.into(), node.into_node_fn());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeNamespace for NodeModule {
    fn get(&self, name: &str) -> Option<NodeFn> {
        self.nodes.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }
}

/// Build a [`NodeModule`] from functions in scope, indexed by their names.
///
/// ```ignore
/// let module = node_module![start, pick, done];
/// ```
#[macro_export]
macro_rules! node_module {
    ($($node:ident),* $(,)?) => {{
        let mut module = $crate::node::registry::NodeModule::new();
        $( module.insert(stringify!($node), $node); )*
        module
    }};
}

/// Resolves node ids to callables
#[derive(Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, NodeFn>,
    namespaces: Vec<Arc<dyn NodeNamespace>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_namespace(namespace: impl NodeNamespace + 'static) -> Self {
        Self::new().with_namespace(namespace)
    }

    #[must_use]
    pub fn with_node<M>(mut self, id: impl Into<NodeId>, node: impl IntoNodeFn<M>) -> Self {
        self.insert(id, node);
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl NodeNamespace + 'static) -> Self {
        self.namespaces.push(Arc::new(namespace));
        self
    }

    pub fn insert<M>(&mut self, id: impl Into<NodeId>, node: impl IntoNodeFn<M>) {
        self.nodes.insert(id.into(), node.into_node_fn());
    }

    /// Look up a node; the explicit map shadows namespaces
    pub fn resolve(&self, id: &str) -> Result<NodeFn, MenuError> {
        if let Some(node) = self.nodes.get(id) {
            return Ok(node.clone());
        }
        self.namespaces
            .iter()
            .find_map(|ns| ns.get(id))
            .ok_or_else(|| MenuError::UnknownNode(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resolve(id).is_ok()
    }

    /// All resolvable node ids, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .nodes
            .keys()
            .cloned()
            .chain(self.namespaces.iter().flat_map(|ns| ns.names()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("nodes", &self.names())
            .finish()
    }
}
