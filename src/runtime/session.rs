//! Menu session runtime
//!
//! Drives the pure state machine for one entity: feeds it events, executes
//! the effects it returns and feeds generated events back until the queue
//! drains. Node logic runs here; everything outside the menu goes through
//! the injected collaborators.

use super::traits::{CommandLayer, MenuStore, OutputSink};
use crate::context::{EntityId, Kwargs, NodeContext};
use crate::error::MenuError;
use crate::lifecycle::{LifecycleManager, MenuSnapshot};
use crate::node::executor::{self, RenderedNode};
use crate::node::registry::NodeRegistry;
use crate::node::NodeId;
use crate::options::{self, Exec, MenuOption, Target};
use crate::state_machine::{transition, Effect, Event, MenuContext, MenuState, Resolution};
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const HELP_FULL: &str = "Commands: <menu option>, help, quit";
const HELP_NO_QUIT: &str = "Commands: <menu option>, help";
const HELP_NO_OPTIONS: &str = "Commands: help, quit";
const HELP_NO_OPTIONS_NO_QUIT: &str = "Commands: help";

/// The collaborators a session talks to
pub struct MenuServices<O, C, S> {
    pub sink: Arc<O>,
    pub commands: Arc<C>,
    pub store: Arc<S>,
}

impl<O, C, S> MenuServices<O, C, S> {
    pub fn new(sink: O, commands: C, store: S) -> Self {
        Self {
            sink: Arc::new(sink),
            commands: Arc::new(commands),
            store: Arc::new(store),
        }
    }
}

impl<O, C, S> Clone for MenuServices<O, C, S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            commands: Arc::clone(&self.commands),
            store: Arc::clone(&self.store),
        }
    }
}

/// One rendered node in the order the entity saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailEntry {
    pub node: NodeId,
    pub text: String,
    pub option_count: usize,
}

/// A running menu for one entity
pub struct MenuSession<O, C, S>
where
    O: OutputSink,
    C: CommandLayer,
    S: MenuStore,
{
    context: MenuContext,
    registry: Arc<NodeRegistry>,
    state: MenuState,
    node_ctx: NodeContext,
    /// The node currently shown; input is matched against its options
    displayed: Option<RenderedNode>,
    visited: HashSet<NodeId>,
    trail: Vec<TrailEntry>,
    lifecycle: LifecycleManager<C, S>,
    sink: Arc<O>,
    cancel: CancellationToken,
}

impl<O, C, S> MenuSession<O, C, S>
where
    O: OutputSink,
    C: CommandLayer,
    S: MenuStore,
{
    pub fn new(
        context: MenuContext,
        registry: Arc<NodeRegistry>,
        services: MenuServices<O, C, S>,
    ) -> Self {
        let node_ctx = NodeContext::new(context.entity.clone(), context.config.attributes.clone());
        Self::build(context, registry, services, MenuState::Entering, node_ctx)
    }

    /// Rebuild a suspended session from its snapshot; call
    /// [`resume`](Self::resume) to show it again
    pub fn restore(
        snapshot: MenuSnapshot,
        registry: Arc<NodeRegistry>,
        services: MenuServices<O, C, S>,
    ) -> Self {
        let MenuSnapshot {
            entity,
            menu,
            config,
            node,
            input,
            kwargs,
            attributes,
            ..
        } = snapshot;
        let node_ctx = NodeContext::new(entity.clone(), attributes);
        let state = MenuState::Suspended {
            node,
            input,
            kwargs,
        };
        let context = MenuContext::new(entity, menu, config);
        Self::build(context, registry, services, state, node_ctx)
    }

    fn build(
        context: MenuContext,
        registry: Arc<NodeRegistry>,
        services: MenuServices<O, C, S>,
        state: MenuState,
        node_ctx: NodeContext,
    ) -> Self {
        let lifecycle = LifecycleManager::new(
            context.entity.clone(),
            &context.menu,
            &context.config,
            services.commands,
            services.store,
        );
        Self {
            context,
            registry,
            state,
            node_ctx,
            displayed: None,
            visited: HashSet::new(),
            trail: Vec::new(),
            lifecycle,
            sink: services.sink,
            cancel: CancellationToken::new(),
        }
    }

    // ==================== Driving the menu ====================

    /// Install the override and show the start node
    pub async fn start(&mut self) -> Result<(), MenuError> {
        tracing::info!(
            entity = %self.context.entity,
            menu = %self.context.menu,
            start_node = %self.context.config.start_node,
            "Starting menu"
        );
        self.process_event(Event::Start).await
    }

    /// Handle one unit of raw input
    pub async fn submit(&mut self, raw: &str) -> Result<(), MenuError> {
        self.process_event(Event::Input {
            raw: raw.to_string(),
        })
        .await
    }

    /// The entity's transport went away
    pub async fn disconnect(&mut self) -> Result<(), MenuError> {
        self.process_event(Event::Disconnect).await
    }

    /// The entity's transport is back; a suspended menu re-runs its node
    pub async fn resume(&mut self) -> Result<(), MenuError> {
        self.process_event(Event::Reconnect).await
    }

    /// Close from outside the menu; a no-op once closing has begun
    pub async fn force_close(&mut self) -> Result<(), MenuError> {
        self.process_event(Event::ForceClose).await
    }

    // ==================== Accessors ====================

    pub fn entity(&self) -> &EntityId {
        &self.context.entity
    }

    pub fn context(&self) -> &MenuContext {
        &self.context
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn current_node(&self) -> Option<&str> {
        self.state.current_node()
    }

    /// The last node that was executed, even after the menu closed
    pub fn last_node(&self) -> &str {
        self.node_ctx.node()
    }

    pub fn displayed(&self) -> Option<&RenderedNode> {
        self.displayed.as_ref()
    }

    pub fn attributes(&self) -> &crate::context::Attributes {
        self.node_ctx.attributes()
    }

    pub fn visited(&self) -> &HashSet<NodeId> {
        &self.visited
    }

    pub fn trail(&self) -> &[TrailEntry] {
        &self.trail
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Token that short-circuits pending work when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current position as a snapshot; `None` unless active or suspended
    pub fn snapshot(&self) -> Option<MenuSnapshot> {
        let (node, input, kwargs) = match &self.state {
            MenuState::Active {
                node,
                input,
                kwargs,
            }
            | MenuState::Suspended {
                node,
                input,
                kwargs,
            } => (node, input, kwargs),
            _ => return None,
        };
        Some(MenuSnapshot {
            entity: self.context.entity.clone(),
            menu: self.context.menu.clone(),
            config: self.context.config.clone(),
            node: node.clone(),
            input: input.clone(),
            kwargs: kwargs.clone(),
            attributes: self.node_ctx.attributes().clone(),
            saved_at: Utc::now(),
        })
    }

    /// An independent copy at the same position, sharing collaborators.
    ///
    /// The copy has its own teardown guard and cancellation token.
    pub fn fork(&self) -> Self {
        Self {
            context: self.context.clone(),
            registry: Arc::clone(&self.registry),
            state: self.state.clone(),
            node_ctx: self.node_ctx.clone(),
            displayed: self.displayed.clone(),
            visited: self.visited.clone(),
            trail: self.trail.clone(),
            lifecycle: self.lifecycle.fork(),
            sink: Arc::clone(&self.sink),
            cancel: CancellationToken::new(),
        }
    }

    // ==================== Event loop ====================

    async fn process_event(&mut self, event: Event) -> Result<(), MenuError> {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let cancelled = self.cancel.is_cancelled();
            if cancelled && !matches!(event, Event::ForceClose | Event::TeardownComplete) {
                tracing::debug!(entity = %self.context.entity, ?event, "Menu cancelled, dropping event");
                continue;
            }

            let result = transition(&self.state, &self.context, event)?;
            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.name() != self.state.name() {
                tracing::debug!(
                    entity = %self.context.entity,
                    from = old_state.name(),
                    to = self.state.name(),
                    "Menu state changed"
                );
            }

            for effect in result.effects {
                // Teardown always runs once the machine has committed to it
                if self.cancel.is_cancelled() && !matches!(effect, Effect::Teardown) {
                    continue;
                }
                if let Some(generated) = self.execute_effect(effect).await {
                    let failed = matches!(generated, Event::Failed { .. });
                    queue.push_back(generated);
                    if failed {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::InstallOverride => match self.lifecycle.install().await {
                Ok(_) => None,
                Err(e) => Some(Event::Failed {
                    message: e.to_string(),
                }),
            },

            Effect::DetachOverride => {
                self.lifecycle.detach().await;
                tracing::info!(entity = %self.context.entity, "Menu suspended");
                None
            }

            Effect::RunNode {
                node,
                input,
                kwargs,
            } => Some(self.run_node(node, input, kwargs).await),

            Effect::ResolveInput { raw } => Some(self.resolve_input(&raw).await),

            Effect::PresentNode => {
                if let Some(displayed) = &self.displayed {
                    let text = displayed.display_text(self.context.config.list_options);
                    self.present(&text).await;
                }
                None
            }

            Effect::PresentHelp => {
                let text = self.help_text();
                self.present(&text).await;
                None
            }

            Effect::PresentError { message } => {
                self.present(&message).await;
                None
            }

            Effect::PersistState => {
                if let Some(snapshot) = self.snapshot() {
                    if let Err(e) = self.lifecycle.save(&snapshot).await {
                        tracing::warn!(entity = %self.context.entity, error = %e, "Failed to save menu snapshot");
                    }
                }
                None
            }

            Effect::Teardown => {
                self.lifecycle.teardown().await;
                Some(Event::TeardownComplete)
            }
        }
    }

    // ==================== Effect helpers ====================

    async fn run_node(&mut self, node: NodeId, input: String, kwargs: Kwargs) -> Event {
        let rendered = self.registry.resolve(&node).and_then(|func| {
            executor::run(&node, &func, &mut self.node_ctx, &input, kwargs.clone())
        });
        self.flush_outbox().await;

        match rendered {
            Ok(rendered) => {
                let terminal = rendered.is_terminal();
                self.visited.insert(node.clone());
                self.trail.push(TrailEntry {
                    node: node.clone(),
                    text: rendered.text.clone().unwrap_or_default(),
                    option_count: rendered.option_count(),
                });
                self.displayed = Some(rendered);
                Event::NodeRendered {
                    node,
                    input,
                    kwargs,
                    terminal,
                }
            }
            Err(e) => {
                tracing::warn!(entity = %self.context.entity, node = %node, error = %e, "Menu node failed");
                Event::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn resolve_input(&mut self, raw: &str) -> Event {
        let Some(displayed) = &self.displayed else {
            return Event::Failed {
                message: "No menu node is displayed".to_string(),
            };
        };

        let option: MenuOption = if let Some(selection) = options::match_key(&displayed.options, raw)
        {
            tracing::debug!(entity = %self.context.entity, matched = ?selection.matched, "Matched option");
            selection.option.clone()
        } else if let Some(resolution) = self.builtin_command(raw) {
            return Event::Resolved { resolution };
        } else if let Some(selection) = options::match_prefix(&displayed.options, raw)
            .or_else(|| options::match_default(&displayed.options))
        {
            tracing::debug!(entity = %self.context.entity, matched = ?selection.matched, "Matched option");
            selection.option.clone()
        } else {
            tracing::debug!(entity = %self.context.entity, input = %raw, "No option matched");
            return Event::Resolved {
                resolution: Resolution::NoMatch,
            };
        };

        match self.select(&option, raw).await {
            Ok(resolution) => Event::Resolved { resolution },
            Err(e) => Event::Failed {
                message: e.to_string(),
            },
        }
    }

    /// Built-in look/quit/help, only consulted when no declared key matched
    fn builtin_command(&self, raw: &str) -> Option<Resolution> {
        let config = &self.context.config;
        match options::normalize_key(raw).as_str() {
            "look" | "l" if config.auto_look => Some(Resolution::Look),
            "quit" | "q" | "exit" if config.auto_quit => Some(Resolution::Quit),
            "help" | "h" if config.auto_help => Some(Resolution::Help),
            _ => None,
        }
    }

    /// Run the option's exec, then evaluate where it leads
    async fn select(&mut self, option: &MenuOption, raw: &str) -> Result<Resolution, MenuError> {
        let current = self.node_ctx.node().to_string();
        let failed = |e: crate::node::NodeError| MenuError::NodeFailed {
            node: current.clone(),
            message: e.to_string(),
        };

        match option.exec() {
            Some(Exec::Call { func, kwargs }) => {
                let result = func(&mut self.node_ctx, raw, kwargs);
                self.flush_outbox().await;
                result.map_err(failed)?;
            }
            Some(Exec::Node { node, kwargs }) => {
                self.exec_node(node, raw, kwargs.clone()).await?;
            }
            None => {}
        }

        let target = options::resolve_target(option, &mut self.node_ctx, raw);
        self.flush_outbox().await;
        Ok(match target.map_err(failed)? {
            Target::Node { node, kwargs } => Resolution::Goto {
                node,
                input: raw.to_string(),
                kwargs,
            },
            Target::Rerun => Resolution::Rerun {
                input: raw.to_string(),
            },
            Target::Exit => Resolution::Exit,
        })
    }

    /// Run a node for its side effects; its text is shown, its options dropped
    async fn exec_node(&mut self, node: &str, raw: &str, kwargs: Kwargs) -> Result<(), MenuError> {
        let current = self.node_ctx.node().to_string();
        let current_kwargs = self.node_ctx.kwargs().clone();

        let func = self.registry.resolve(node)?;
        let rendered = executor::run(node, &func, &mut self.node_ctx, raw, kwargs);
        self.node_ctx.enter(&current, current_kwargs);
        self.flush_outbox().await;

        if let Some(text) = rendered?.text.filter(|t| !t.trim().is_empty()) {
            self.present(&text).await;
        }
        Ok(())
    }

    fn help_text(&self) -> String {
        let has_options = self
            .displayed
            .as_ref()
            .is_some_and(|d| !d.options.is_empty());
        if let Some(help) = self.displayed.as_ref().and_then(|d| d.help.clone()) {
            return help;
        }
        let text = match (has_options, self.context.config.auto_quit) {
            (true, true) => HELP_FULL,
            (true, false) => HELP_NO_QUIT,
            (false, true) => HELP_NO_OPTIONS,
            (false, false) => HELP_NO_OPTIONS_NO_QUIT,
        };
        text.to_string()
    }

    async fn flush_outbox(&mut self) {
        for message in self.node_ctx.take_outbox() {
            self.present(&message).await;
        }
    }

    async fn present(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.sink.present(&self.context.entity, text).await {
            tracing::warn!(entity = %self.context.entity, error = %e, "Failed to deliver menu output");
        }
    }
}
