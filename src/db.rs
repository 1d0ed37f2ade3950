//! Database module for the menu engine
//!
//! Provides persistence for suspended menus. One snapshot per entity; the
//! full snapshot is stored as JSON next to a few indexed columns.

mod schema;

pub use schema::*;

use crate::context::EntityId;
use crate::lifecycle::MenuSnapshot;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Snapshot Operations ====================

    /// Insert or replace the entity's snapshot
    pub fn save_snapshot(&self, snapshot: &MenuSnapshot) -> DbResult<()> {
        let json = serde_json::to_string(snapshot)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO menu_snapshots (entity_id, menu, node, snapshot, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(entity_id) DO UPDATE SET
                menu = excluded.menu,
                node = excluded.node,
                snapshot = excluded.snapshot,
                saved_at = excluded.saved_at",
            params![
                snapshot.entity.as_str(),
                snapshot.menu,
                snapshot.node,
                json,
                snapshot.saved_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn load_snapshot(&self, entity: &EntityId) -> DbResult<Option<MenuSnapshot>> {
        let conn = self.conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM menu_snapshots WHERE entity_id = ?1",
                params![entity.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Delete the entity's snapshot; missing rows are fine
    pub fn clear_snapshot(&self, entity: &EntityId) -> DbResult<()> {
        self.conn()?.execute(
            "DELETE FROM menu_snapshots WHERE entity_id = ?1",
            params![entity.as_str()],
        )?;
        Ok(())
    }

    /// All suspended menus, most recently saved first
    pub fn list_snapshots(&self) -> DbResult<Vec<SnapshotInfo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT entity_id, menu, node, saved_at FROM menu_snapshots ORDER BY saved_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SnapshotInfo {
                entity: EntityId::new(row.get::<_, String>(0)?),
                menu: row.get(1)?,
                node: row.get(2)?,
                saved_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;
        let infos = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(infos)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
