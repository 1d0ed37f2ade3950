//! In-process command layer
//!
//! Each entity has a set of standing commands plus a stack of overrides.
//! The commands actually available are computed by merging the overrides
//! onto the standing set in priority order, lowest first; overrides with
//! equal priority apply in install order.

use super::traits::CommandLayer;
use crate::config::MergeType;
use crate::context::EntityId;
use crate::lifecycle::{OverrideId, OverrideSpec};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

/// Handler run when an entity executes a command
pub type CommandHandler = Arc<dyn Fn(&EntityId) -> Result<(), String> + Send + Sync>;

#[derive(Debug, Clone)]
struct Layer {
    id: OverrideId,
    spec: OverrideSpec,
}

#[derive(Default)]
struct StackState {
    layers: HashMap<EntityId, Vec<Layer>>,
    history: Vec<(EntityId, String)>,
}

pub struct CommandStack {
    standing: BTreeSet<String>,
    handlers: HashMap<String, CommandHandler>,
    state: Mutex<StackState>,
}

impl CommandStack {
    pub fn new<I, T>(standing: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            standing: standing.into_iter().map(|c| c.into().to_lowercase()).collect(),
            handlers: HashMap::new(),
            state: Mutex::new(StackState::default()),
        }
    }

    /// Run `handler` whenever `command` is executed
    #[must_use]
    pub fn with_handler<F>(mut self, command: &str, handler: F) -> Self
    where
        F: Fn(&EntityId) -> Result<(), String> + Send + Sync + 'static,
    {
        self.handlers
            .insert(command.to_lowercase(), Arc::new(handler));
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StackState>, String> {
        self.state
            .lock()
            .map_err(|_| "command stack lock poisoned".to_string())
    }

    /// Commands currently available to the entity
    pub fn effective_commands(&self, entity: &EntityId) -> BTreeSet<String> {
        let Ok(state) = self.lock() else {
            return self.standing.clone();
        };
        let mut layers: Vec<&Layer> = state
            .layers
            .get(entity)
            .map(|l| l.iter().collect())
            .unwrap_or_default();
        // stable sort keeps install order within a priority
        layers.sort_by_key(|l| l.spec.priority);

        layers.iter().fold(self.standing.clone(), |current, layer| {
            merge(&current, &layer.spec)
        })
    }

    /// Number of overrides installed for the entity
    pub fn depth(&self, entity: &EntityId) -> usize {
        self.lock()
            .map(|s| s.layers.get(entity).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Commands executed so far, in order
    pub fn history(&self) -> Vec<(EntityId, String)> {
        self.lock().map(|s| s.history.clone()).unwrap_or_default()
    }
}

fn merge(current: &BTreeSet<String>, spec: &OverrideSpec) -> BTreeSet<String> {
    let incoming: BTreeSet<String> = spec.commands.iter().map(|c| c.to_lowercase()).collect();
    match spec.merge_type {
        MergeType::Replace => incoming,
        MergeType::Union => current.union(&incoming).cloned().collect(),
        MergeType::Intersect => current.intersection(&incoming).cloned().collect(),
        MergeType::Remove => current.difference(&incoming).cloned().collect(),
    }
}

#[async_trait]
impl CommandLayer for CommandStack {
    async fn install(&self, entity: &EntityId, spec: &OverrideSpec) -> Result<OverrideId, String> {
        let id = OverrideId::new();
        self.lock()?
            .layers
            .entry(entity.clone())
            .or_default()
            .push(Layer {
                id,
                spec: spec.clone(),
            });
        Ok(id)
    }

    async fn remove(&self, entity: &EntityId, id: OverrideId) -> Result<(), String> {
        let mut state = self.lock()?;
        let layers = state
            .layers
            .get_mut(entity)
            .ok_or_else(|| format!("no overrides for {entity}"))?;
        let before = layers.len();
        layers.retain(|l| l.id != id);
        if layers.len() == before {
            return Err(format!("override {id} not installed for {entity}"));
        }
        if layers.is_empty() {
            state.layers.remove(entity);
        }
        Ok(())
    }

    async fn execute(&self, entity: &EntityId, command: &str) -> Result<(), String> {
        let command = command.trim().to_lowercase();
        if !self.effective_commands(entity).contains(&command) {
            return Err(format!("Command '{command}' is not available"));
        }
        self.lock()?.history.push((entity.clone(), command.clone()));
        match self.handlers.get(&command) {
            Some(handler) => handler(entity),
            None => Ok(()),
        }
    }
}
