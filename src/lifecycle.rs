//! Menu lifecycle
//!
//! Owns everything a menu does to the world outside its own state: the
//! command override installed while the menu is open, the snapshot kept for
//! persistent menus, and the exit command run when the menu closes.

use crate::config::{MenuConfig, MergeType};
use crate::context::{Attributes, EntityId, Kwargs};
use crate::error::MenuError;
use crate::node::NodeId;
use crate::runtime::traits::{CommandLayer, MenuStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Command receiving empty input while a menu is open
pub const NOINPUT_COMMAND: &str = "__noinput_command";
/// Command receiving any input no other command claims
pub const NOMATCH_COMMAND: &str = "__nomatch_command";

/// Handle for an installed override, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideId(Uuid);

impl OverrideId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OverrideId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OverrideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Commands a menu lays over the entity's standing commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSpec {
    pub key: String,
    pub merge_type: MergeType,
    pub priority: i32,
    pub commands: Vec<String>,
}

impl OverrideSpec {
    /// The override for `menu`: the input catch-alls plus enabled built-ins
    pub fn for_menu(menu: &str, config: &MenuConfig) -> Self {
        let mut commands = vec![NOINPUT_COMMAND.to_string(), NOMATCH_COMMAND.to_string()];
        if config.auto_look {
            commands.extend(["look", "l"].map(String::from));
        }
        if config.auto_quit {
            commands.extend(["quit", "q", "exit"].map(String::from));
        }
        if config.auto_help {
            commands.extend(["help", "h"].map(String::from));
        }
        Self {
            key: format!("menu:{menu}"),
            merge_type: config.merge_type,
            priority: config.priority,
            commands,
        }
    }
}

/// Everything needed to resume a persistent menu after a reconnect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSnapshot {
    pub entity: EntityId,
    /// Catalog name of the menu tree
    pub menu: String,
    pub config: MenuConfig,
    pub node: NodeId,
    /// Input that led to `node`
    pub input: String,
    pub kwargs: Kwargs,
    pub attributes: Attributes,
    pub saved_at: DateTime<Utc>,
}

/// Installs, detaches and tears down one menu's override.
///
/// Teardown runs at most once per menu instance no matter how many exit
/// paths trigger it.
pub struct LifecycleManager<C: CommandLayer, S: MenuStore> {
    entity: EntityId,
    spec: OverrideSpec,
    persistent: bool,
    exit_command: Option<String>,
    commands: Arc<C>,
    store: Arc<S>,
    installed: Option<OverrideId>,
    torn_down: AtomicBool,
}

impl<C: CommandLayer, S: MenuStore> LifecycleManager<C, S> {
    pub fn new(
        entity: EntityId,
        menu: &str,
        config: &MenuConfig,
        commands: Arc<C>,
        store: Arc<S>,
    ) -> Self {
        Self {
            entity,
            spec: OverrideSpec::for_menu(menu, config),
            persistent: config.persistent,
            exit_command: config.exit_command.clone(),
            commands,
            store,
            installed: None,
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn spec(&self) -> &OverrideSpec {
        &self.spec
    }

    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Install the override; a second call while installed is a no-op
    pub async fn install(&mut self) -> Result<OverrideId, MenuError> {
        if let Some(id) = self.installed {
            return Ok(id);
        }
        let id = self
            .commands
            .install(&self.entity, &self.spec)
            .await
            .map_err(MenuError::CommandLayer)?;
        tracing::debug!(entity = %self.entity, override_id = %id, key = %self.spec.key, "Installed menu override");
        self.installed = Some(id);
        Ok(id)
    }

    /// Remove the override without any exit behavior
    pub async fn detach(&mut self) {
        let Some(id) = self.installed.take() else {
            return;
        };
        match self.commands.remove(&self.entity, id).await {
            Ok(()) => {
                tracing::debug!(entity = %self.entity, override_id = %id, "Removed menu override");
            }
            Err(e) => {
                tracing::warn!(entity = %self.entity, override_id = %id, error = %e, "Failed to remove menu override");
            }
        }
    }

    /// Save a snapshot; non-persistent menus save nothing
    pub async fn save(&self, snapshot: &MenuSnapshot) -> Result<(), MenuError> {
        if !self.persistent {
            return Ok(());
        }
        self.store.save(snapshot).await.map_err(MenuError::Store)
    }

    /// Remove the override, clear saved state and run the exit command.
    ///
    /// Returns `false` if teardown already ran. Collaborator failures are
    /// logged and do not stop the remaining steps.
    pub async fn teardown(&mut self) -> bool {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            tracing::debug!(entity = %self.entity, "Menu teardown already ran");
            return false;
        }

        self.detach().await;

        if self.persistent {
            if let Err(e) = self.store.clear(&self.entity).await {
                tracing::warn!(entity = %self.entity, error = %e, "Failed to clear menu snapshot");
            }
        }

        if let Some(command) = &self.exit_command {
            if let Err(e) = self.commands.execute(&self.entity, command).await {
                tracing::warn!(entity = %self.entity, command = %command, error = %e, "Exit command failed");
            }
        }

        tracing::info!(entity = %self.entity, key = %self.spec.key, "Menu closed");
        true
    }

    /// Same collaborators and override, fresh teardown guard
    pub fn fork(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            spec: self.spec.clone(),
            persistent: self.persistent,
            exit_command: self.exit_command.clone(),
            commands: Arc::clone(&self.commands),
            store: Arc::clone(&self.store),
            installed: self.installed,
            torn_down: AtomicBool::new(self.is_torn_down()),
        }
    }
}
