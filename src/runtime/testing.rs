//! Mock implementations for testing
//!
//! These mocks enable session and manager tests without a transport, a
//! command system or a database. [`MenuTester`] walks a whole menu tree.

use super::session::MenuSession;
use super::traits::*;
use crate::context::EntityId;
use crate::lifecycle::{MenuSnapshot, OverrideId, OverrideSpec};
use crate::options::DEFAULT_KEY;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Session wired to the mocks in this module
pub type MockSession = MenuSession<RecordingSink, MockCommandLayer, InMemoryMenuStore>;

// ============================================================================
// Recording Sink
// ============================================================================

/// Output sink that records everything presented
#[allow(dead_code)]
pub struct RecordingSink {
    messages: Mutex<Vec<(EntityId, String)>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    /// All presented texts, in order
    pub fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Texts presented to one entity
    pub fn texts_for(&self, entity: &EntityId) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == entity)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputSink for RecordingSink {
    async fn present(&self, entity: &EntityId, text: &str) -> Result<(), String> {
        self.messages
            .lock()
            .unwrap()
            .push((entity.clone(), text.to_string()));
        Ok(())
    }
}

// ============================================================================
// Mock Command Layer
// ============================================================================

/// Command layer that counts calls and can be told to fail
#[allow(dead_code)]
pub struct MockCommandLayer {
    installs: AtomicUsize,
    removes: AtomicUsize,
    executed: Mutex<Vec<(EntityId, String)>>,
    installed: Mutex<Vec<OverrideSpec>>,
    fail_install: bool,
    fail_remove: bool,
}

#[allow(dead_code)]
impl MockCommandLayer {
    pub fn new() -> Self {
        Self {
            installs: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
            installed: Mutex::new(Vec::new()),
            fail_install: false,
            fail_remove: false,
        }
    }

    #[must_use]
    pub fn failing_install(mut self) -> Self {
        self.fail_install = true;
        self
    }

    #[must_use]
    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn install_count(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    /// Commands executed so far, in order
    pub fn executed(&self) -> Vec<(EntityId, String)> {
        self.executed.lock().unwrap().clone()
    }

    /// Every override spec ever installed
    pub fn installed_specs(&self) -> Vec<OverrideSpec> {
        self.installed.lock().unwrap().clone()
    }
}

impl Default for MockCommandLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandLayer for MockCommandLayer {
    async fn install(&self, _entity: &EntityId, spec: &OverrideSpec) -> Result<OverrideId, String> {
        if self.fail_install {
            return Err("install refused".to_string());
        }
        self.installs.fetch_add(1, Ordering::SeqCst);
        self.installed.lock().unwrap().push(spec.clone());
        Ok(OverrideId::new())
    }

    async fn remove(&self, _entity: &EntityId, _id: OverrideId) -> Result<(), String> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        if self.fail_remove {
            return Err("remove refused".to_string());
        }
        Ok(())
    }

    async fn execute(&self, entity: &EntityId, command: &str) -> Result<(), String> {
        self.executed
            .lock()
            .unwrap()
            .push((entity.clone(), command.to_string()));
        Ok(())
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// Snapshot store kept in a map
#[allow(dead_code)]
pub struct InMemoryMenuStore {
    snapshots: Mutex<HashMap<EntityId, MenuSnapshot>>,
}

#[allow(dead_code)]
impl InMemoryMenuStore {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, entity: &EntityId) -> Option<MenuSnapshot> {
        self.snapshots.lock().unwrap().get(entity).cloned()
    }
}

impl Default for InMemoryMenuStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MenuStore for InMemoryMenuStore {
    async fn save(&self, snapshot: &MenuSnapshot) -> Result<(), String> {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.entity.clone(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, entity: &EntityId) -> Result<Option<MenuSnapshot>, String> {
        Ok(self.get(entity))
    }

    async fn clear(&self, entity: &EntityId) -> Result<(), String> {
        self.snapshots.lock().unwrap().remove(entity);
        Ok(())
    }
}

// ============================================================================
// Menu Tester
// ============================================================================

/// Shape of a depth-first walk: node names, with the nodes reached from a
/// node nested in the branch that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    Node(String),
    Branch(Vec<Tree>),
}

impl Tree {
    pub fn node(name: &str) -> Self {
        Tree::Node(name.to_string())
    }

    pub fn branch(items: impl IntoIterator<Item = Tree>) -> Self {
        Tree::Branch(items.into_iter().collect())
    }
}

/// Walks every option of a menu, depth first.
///
/// Each option is selected with an input that addresses it. A branch is
/// followed the first time its node is reached; a node already visited is
/// recorded but not entered again. When a selection closes the menu the
/// session is put back to where it was before the selection.
#[derive(Debug, Default)]
pub struct MenuTester {
    expected_texts: HashMap<String, String>,
    expected_option_counts: HashMap<String, usize>,
    expected_options: HashMap<String, Vec<String>>,
}

#[allow(dead_code)]
impl MenuTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node `node` must present text starting with `prefix`
    #[must_use]
    pub fn expect_text(mut self, node: &str, prefix: &str) -> Self {
        self.expected_texts
            .insert(node.to_string(), prefix.to_string());
        self
    }

    #[must_use]
    pub fn expect_option_count(mut self, node: &str, count: usize) -> Self {
        self.expected_option_counts.insert(node.to_string(), count);
        self
    }

    /// Node `node` must offer exactly these options, by listed key in
    /// declaration order; a bare catch-all is listed as `_default`
    #[must_use]
    pub fn expect_options(mut self, node: &str, keys: &[&str]) -> Self {
        self.expected_options.insert(
            node.to_string(),
            keys.iter().map(|k| (*k).to_string()).collect(),
        );
        self
    }

    /// Walk from the session's current node; returns the traversal tree and
    /// the visit order
    pub async fn traverse(&self, session: &mut MockSession) -> (Vec<Tree>, Vec<String>) {
        let start = session.last_node().to_string();
        let mut visited = vec![start.clone()];
        let mut tree = vec![Tree::Node(start)];
        self.depth_first(session, &mut tree, &mut visited).await;
        (tree, visited)
    }

    fn depth_first<'a>(
        &'a self,
        session: &'a mut MockSession,
        tree: &'a mut Vec<Tree>,
        visited: &'a mut Vec<String>,
    ) -> BoxFuture<'a, ()> {
        async move {
            let node = session.last_node().to_string();
            let options = session
                .displayed()
                .map(|d| d.options.clone())
                .unwrap_or_default();
            self.check_node(session, &node, options.len());

            if options.is_empty() {
                if !visited.contains(&node) {
                    visited.push(node);
                }
                return;
            }

            let mut subtree = Vec::new();
            for option in &options {
                let input = option.probe_input();
                let backup = session.fork();

                if let Err(e) = session.submit(&input).await {
                    panic!("input {input:?} at node {node} failed: {e}");
                }
                let reached = session.last_node().to_string();

                if session.is_finished() {
                    *session = backup;
                    visited.push(reached.clone());
                    subtree.push(Tree::Node(reached));
                } else if !visited.contains(&reached) {
                    visited.push(reached.clone());
                    subtree.push(Tree::Node(reached));
                    self.depth_first(session, &mut subtree, visited).await;
                } else {
                    subtree.push(Tree::Node(reached));
                }
            }

            if !subtree.is_empty() {
                tree.push(Tree::Branch(subtree));
            }
        }
        .boxed()
    }

    fn check_node(&self, session: &MockSession, node: &str, option_count: usize) {
        if let Some(prefix) = self.expected_texts.get(node) {
            let text = session
                .displayed()
                .and_then(|d| d.text.clone())
                .unwrap_or_default();
            assert!(
                text.trim().starts_with(prefix.as_str()),
                "node {node}: text {text:?} does not start with {prefix:?}"
            );
        }
        if let Some(expected) = self.expected_options.get(node) {
            let keys: Vec<&str> = session
                .displayed()
                .map(|d| {
                    d.options
                        .iter()
                        .map(|o| o.display_key().unwrap_or(DEFAULT_KEY))
                        .collect()
                })
                .unwrap_or_default();
            assert_eq!(keys, *expected, "wrong options at node {node}");
        }
        if let Some(expected) = self.expected_option_counts.get(node) {
            assert_eq!(
                option_count, *expected,
                "wrong number of options from node {node}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MenuConfig;
    use crate::node::registry::NodeRegistry;
    use crate::node::NodeOutput;
    use crate::options::OptionSpec;
    use crate::runtime::session::MenuServices;
    use crate::state_machine::MenuContext;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_recording_sink_filters_by_entity() {
        let sink = RecordingSink::new();
        sink.present(&EntityId::new("a"), "one").await.unwrap();
        sink.present(&EntityId::new("b"), "two").await.unwrap();
        assert_eq!(sink.texts(), vec!["one", "two"]);
        assert_eq!(sink.texts_for(&EntityId::new("b")), vec!["two"]);
        sink.clear();
        assert!(sink.texts().is_empty());
    }

    #[tokio::test]
    async fn test_mock_command_layer_counts() {
        let layer = MockCommandLayer::new();
        let entity = EntityId::new("a");
        let spec = OverrideSpec::for_menu("m", &MenuConfig::new("start"));
        let id = layer.install(&entity, &spec).await.unwrap();
        layer.remove(&entity, id).await.unwrap();
        layer.execute(&entity, "look").await.unwrap();

        assert_eq!(layer.install_count(), 1);
        assert_eq!(layer.remove_count(), 1);
        assert_eq!(layer.installed_specs(), vec![spec]);
        assert_eq!(layer.executed(), vec![(entity, "look".to_string())]);

        let failing = MockCommandLayer::new().failing_install();
        assert!(failing
            .install(&EntityId::new("a"), &OverrideSpec::for_menu("m", &MenuConfig::new("s")))
            .await
            .is_err());
    }

    fn hub() -> NodeOutput {
        NodeOutput::new("hub").with_options([
            OptionSpec::with_key("left").goto("leaf"),
            OptionSpec::with_key("right").goto("hub"),
            OptionSpec::with_key("done").goto("end"),
        ])
    }

    fn leaf() -> NodeOutput {
        NodeOutput::new("leaf").with_options(OptionSpec::new().goto("hub"))
    }

    fn end() -> NodeOutput {
        NodeOutput::new("bye")
    }

    #[tokio::test]
    async fn test_tester_walks_small_menu() {
        let registry = NodeRegistry::from_namespace(crate::node_module![hub, leaf, end]);
        let services = MenuServices::new(
            RecordingSink::new(),
            MockCommandLayer::new(),
            InMemoryMenuStore::new(),
        );
        let context = MenuContext::new(EntityId::new("walker"), "small", MenuConfig::new("hub"));
        let mut session = MenuSession::new(context, Arc::new(registry), services.clone());
        session.start().await.unwrap();

        let tester = MenuTester::new()
            .expect_text("leaf", "leaf")
            .expect_option_count("hub", 3)
            .expect_options("hub", &["left", "right", "done"])
            .expect_options("leaf", &["1"]);
        let (tree, visited) = tester.traverse(&mut session).await;

        assert_eq!(
            tree,
            vec![
                Tree::node("hub"),
                Tree::branch([
                    Tree::node("leaf"),
                    Tree::branch([Tree::node("hub")]),
                    Tree::node("hub"),
                    Tree::node("end"),
                ]),
            ]
        );
        assert_eq!(visited, vec!["hub", "leaf", "end"]);
        // the exit happened on a fork; the walked session is still open
        assert!(session.state().is_active());
        assert_eq!(services.commands.remove_count(), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "wrong options at node hub")]
    async fn test_tester_rejects_unexpected_options() {
        let registry = NodeRegistry::from_namespace(crate::node_module![hub, leaf, end]);
        let context = MenuContext::new(EntityId::new("walker"), "small", MenuConfig::new("hub"));
        let services = MenuServices::new(
            RecordingSink::new(),
            MockCommandLayer::new(),
            InMemoryMenuStore::new(),
        );
        let mut session = MenuSession::new(context, Arc::new(registry), services);
        session.start().await.unwrap();

        MenuTester::new()
            .expect_options("hub", &["left", "done"])
            .traverse(&mut session)
            .await;
    }
}
