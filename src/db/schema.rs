//! Database schema and row types

use crate::context::EntityId;
use chrono::{DateTime, Utc};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS menu_snapshots (
    entity_id TEXT PRIMARY KEY,
    menu TEXT NOT NULL,
    node TEXT NOT NULL,
    snapshot TEXT NOT NULL,
    saved_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_menu_snapshots_menu ON menu_snapshots(menu);
CREATE INDEX IF NOT EXISTS idx_menu_snapshots_saved ON menu_snapshots(saved_at DESC);
";

/// Summary row for a suspended menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub entity: EntityId,
    pub menu: String,
    pub node: String,
    pub saved_at: DateTime<Utc>,
}
