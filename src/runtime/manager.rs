//! Manager for all open menus
//!
//! Keeps at most one session per entity. Sessions for different entities
//! run independently; calls for the same entity are serialized through the
//! session's lock.

use super::session::{MenuServices, MenuSession};
use super::traits::{CommandLayer, MenuStore, OutputSink};
use crate::config::MenuConfig;
use crate::context::EntityId;
use crate::error::MenuError;
use crate::node::registry::NodeRegistry;
use crate::state_machine::{MenuContext, MenuState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Handle to interact with an open menu
struct SessionHandle<O, C, S>
where
    O: OutputSink,
    C: CommandLayer,
    S: MenuStore,
{
    session: Arc<Mutex<MenuSession<O, C, S>>>,
    cancel: CancellationToken,
}

impl<O, C, S> Clone for SessionHandle<O, C, S>
where
    O: OutputSink,
    C: CommandLayer,
    S: MenuStore,
{
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            cancel: self.cancel.clone(),
        }
    }
}

pub struct MenuManager<O, C, S>
where
    O: OutputSink,
    C: CommandLayer,
    S: MenuStore,
{
    services: MenuServices<O, C, S>,
    /// Menu trees by name, shared read-only by every session
    catalog: RwLock<HashMap<String, Arc<NodeRegistry>>>,
    sessions: RwLock<HashMap<EntityId, SessionHandle<O, C, S>>>,
}

impl<O, C, S> MenuManager<O, C, S>
where
    O: OutputSink + 'static,
    C: CommandLayer + 'static,
    S: MenuStore + 'static,
{
    pub fn new(services: MenuServices<O, C, S>) -> Self {
        Self {
            services,
            catalog: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_menu(&self, name: impl Into<String>, registry: NodeRegistry) {
        let name = name.into();
        tracing::debug!(menu = %name, nodes = registry.names().len(), "Registered menu");
        self.catalog.write().await.insert(name, Arc::new(registry));
    }

    async fn registry(&self, menu: &str) -> Result<Arc<NodeRegistry>, MenuError> {
        self.catalog
            .read()
            .await
            .get(menu)
            .cloned()
            .ok_or_else(|| MenuError::UnknownMenu(menu.to_string()))
    }

    async fn handle(&self, entity: &EntityId) -> Result<SessionHandle<O, C, S>, MenuError> {
        self.sessions
            .read()
            .await
            .get(entity)
            .cloned()
            .ok_or_else(|| MenuError::NoSession(entity.clone()))
    }

    /// Open `menu` for `entity` and show its start node.
    ///
    /// Fails with `AlreadyActive` while the entity has an open menu, in
    /// memory or suspended in the store.
    pub async fn open(
        &self,
        entity: EntityId,
        menu: &str,
        config: MenuConfig,
    ) -> Result<(), MenuError> {
        let registry = self.registry(menu).await?;
        if self.has_suspended(&entity).await? {
            return Err(MenuError::AlreadyActive(entity));
        }
        let context = MenuContext::new(entity.clone(), menu, config);
        let session = MenuSession::new(context, registry, self.services.clone());
        let handle = self.insert(entity.clone(), session).await?;

        let mut session = handle.session.lock().await;
        let result = session.start().await;
        let finished = session.is_finished();
        drop(session);

        if finished {
            self.sessions.write().await.remove(&entity);
        }
        result
    }

    async fn insert(
        &self,
        entity: EntityId,
        session: MenuSession<O, C, S>,
    ) -> Result<SessionHandle<O, C, S>, MenuError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&entity) {
            return Err(MenuError::AlreadyActive(entity));
        }
        let handle = SessionHandle {
            cancel: session.cancel_token(),
            session: Arc::new(Mutex::new(session)),
        };
        sessions.insert(entity, handle.clone());
        Ok(handle)
    }

    /// Route one line of input to the entity's menu
    pub async fn submit(&self, entity: &EntityId, raw: &str) -> Result<(), MenuError> {
        let handle = self.handle(entity).await?;
        let mut session = handle.session.lock().await;
        let result = session.submit(raw).await;
        let finished = session.is_finished();
        drop(session);

        if finished {
            self.forget(entity, &handle).await;
        }
        result
    }

    /// Transport loss: persistent menus suspend to the store, others exit.
    ///
    /// Either way the in-memory session is dropped; a suspended menu comes
    /// back through [`reconnect`](Self::reconnect).
    pub async fn disconnect(&self, entity: &EntityId) -> Result<(), MenuError> {
        let handle = self.handle(entity).await?;
        let result = handle.session.lock().await.disconnect().await;
        self.forget(entity, &handle).await;
        result
    }

    /// Bring back a suspended menu, if the entity has one.
    ///
    /// Returns `false` when there was nothing to resume.
    pub async fn reconnect(&self, entity: &EntityId) -> Result<bool, MenuError> {
        if let Ok(handle) = self.handle(entity).await {
            handle.session.lock().await.resume().await?;
            return Ok(true);
        }

        let Some(snapshot) = self
            .services
            .store
            .load(entity)
            .await
            .map_err(MenuError::Store)?
        else {
            return Ok(false);
        };

        tracing::info!(entity = %entity, menu = %snapshot.menu, node = %snapshot.node, "Resuming menu");
        let registry = self.registry(&snapshot.menu).await?;
        let session = MenuSession::restore(snapshot, registry, self.services.clone());
        let handle = self.insert(entity.clone(), session).await?;

        let mut session = handle.session.lock().await;
        let result = session.resume().await;
        let finished = session.is_finished();
        drop(session);

        if finished {
            self.forget(entity, &handle).await;
        }
        result.map(|()| true)
    }

    /// Close the entity's menu from outside.
    ///
    /// Pending work in the session is cancelled before waiting for its lock.
    /// A menu that is only suspended in the store is discarded; its override
    /// was already detached when it suspended.
    pub async fn force_close(&self, entity: &EntityId) -> Result<(), MenuError> {
        let handle = match self.handle(entity).await {
            Ok(handle) => handle,
            Err(e) => {
                if !self.has_suspended(entity).await? {
                    return Err(e);
                }
                tracing::info!(entity = %entity, "Discarding suspended menu");
                return self.services.store.clear(entity).await.map_err(MenuError::Store);
            }
        };
        handle.cancel.cancel();
        let result = handle.session.lock().await.force_close().await;
        self.forget(entity, &handle).await;
        result
    }

    pub async fn is_active(&self, entity: &EntityId) -> bool {
        self.sessions.read().await.contains_key(entity)
    }

    /// The state of the entity's menu, if one is open
    pub async fn state(&self, entity: &EntityId) -> Option<MenuState> {
        let handle = self.handle(entity).await.ok()?;
        let state = handle.session.lock().await.state().clone();
        Some(state)
    }

    pub async fn active_entities(&self) -> Vec<EntityId> {
        let mut entities: Vec<EntityId> = self.sessions.read().await.keys().cloned().collect();
        entities.sort();
        entities
    }

    async fn has_suspended(&self, entity: &EntityId) -> Result<bool, MenuError> {
        let snapshot = self
            .services
            .store
            .load(entity)
            .await
            .map_err(MenuError::Store)?;
        Ok(snapshot.is_some())
    }

    /// Drop the entity's entry if it still points at `handle`
    async fn forget(&self, entity: &EntityId, handle: &SessionHandle<O, C, S>) {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(entity)
            .is_some_and(|h| Arc::ptr_eq(&h.session, &handle.session))
        {
            sessions.remove(entity);
        }
    }
}
