//! Trait abstractions for menu I/O
//!
//! A session never talks to a transport, a command system or a database
//! directly; it goes through these traits so tests can swap in mocks.

use crate::context::EntityId;
use crate::lifecycle::{MenuSnapshot, OverrideId, OverrideSpec};
use async_trait::async_trait;
use std::sync::Arc;

/// Where menu text is sent
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn present(&self, entity: &EntityId, text: &str) -> Result<(), String>;
}

/// The command system a menu overrides while it is open
#[async_trait]
pub trait CommandLayer: Send + Sync {
    /// Lay `spec` over the entity's current commands
    async fn install(&self, entity: &EntityId, spec: &OverrideSpec) -> Result<OverrideId, String>;

    /// Remove a previously installed override
    async fn remove(&self, entity: &EntityId, id: OverrideId) -> Result<(), String>;

    /// Run a command as the entity
    async fn execute(&self, entity: &EntityId, command: &str) -> Result<(), String>;
}

/// Durable storage for persistent menu snapshots, keyed by entity
#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn save(&self, snapshot: &MenuSnapshot) -> Result<(), String>;

    async fn load(&self, entity: &EntityId) -> Result<Option<MenuSnapshot>, String>;

    async fn clear(&self, entity: &EntityId) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    async fn present(&self, entity: &EntityId, text: &str) -> Result<(), String> {
        (**self).present(entity, text).await
    }
}

#[async_trait]
impl<T: CommandLayer + ?Sized> CommandLayer for Arc<T> {
    async fn install(&self, entity: &EntityId, spec: &OverrideSpec) -> Result<OverrideId, String> {
        (**self).install(entity, spec).await
    }

    async fn remove(&self, entity: &EntityId, id: OverrideId) -> Result<(), String> {
        (**self).remove(entity, id).await
    }

    async fn execute(&self, entity: &EntityId, command: &str) -> Result<(), String> {
        (**self).execute(entity, command).await
    }
}

#[async_trait]
impl<T: MenuStore + ?Sized> MenuStore for Arc<T> {
    async fn save(&self, snapshot: &MenuSnapshot) -> Result<(), String> {
        (**self).save(snapshot).await
    }

    async fn load(&self, entity: &EntityId) -> Result<Option<MenuSnapshot>, String> {
        (**self).load(entity).await
    }

    async fn clear(&self, entity: &EntityId) -> Result<(), String> {
        (**self).clear(entity).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::db::Database;

/// Adapter to use the SQLite database as a menu store
#[derive(Clone)]
pub struct SqliteMenuStore {
    db: Database,
}

impl SqliteMenuStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl MenuStore for SqliteMenuStore {
    async fn save(&self, snapshot: &MenuSnapshot) -> Result<(), String> {
        self.db.save_snapshot(snapshot).map_err(|e| e.to_string())
    }

    async fn load(&self, entity: &EntityId) -> Result<Option<MenuSnapshot>, String> {
        self.db.load_snapshot(entity).map_err(|e| e.to_string())
    }

    async fn clear(&self, entity: &EntityId) -> Result<(), String> {
        self.db.clear_snapshot(entity).map_err(|e| e.to_string())
    }
}
