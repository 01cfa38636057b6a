//! Map layout versions

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::{info, instrument};

use super::parse::{parse_datetime, parse_layout, OptionalExt};
use crate::error::Result;
use crate::models::MapLayout;

/// One saved layout version
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutVersion {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub layout: MapLayout,
}

pub struct LayoutStore<'a> {
    conn: &'a Connection,
}

impl<'a> LayoutStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append a new version; the latest version wins on load
    #[instrument(skip(self, layout), fields(halls = layout.halls.len(), stalls = layout.stall_count()))]
    pub fn save(&self, layout: &MapLayout) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO map_layouts (layout_json, created_at) VALUES (?1, ?2)",
            params![layout.to_json()?, Utc::now().to_rfc3339()],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(version = id, "Saved map layout");
        Ok(id)
    }

    /// Most recent version, if any
    #[instrument(skip(self))]
    pub fn load_latest(&self) -> Result<Option<LayoutVersion>> {
        let version = self
            .conn
            .query_row(
                "SELECT id, layout_json, created_at FROM map_layouts ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(LayoutVersion {
                        id: row.get(0)?,
                        layout: parse_layout(&row.get::<_, String>(1)?)?,
                        created_at: parse_datetime(&row.get::<_, String>(2)?)?,
                    })
                },
            )
            .optional()?;
        Ok(version)
    }

    #[instrument(skip(self))]
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM map_layouts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Drop every version; returns how many were removed
    #[instrument(skip(self))]
    pub fn delete_all(&self) -> Result<u64> {
        let removed = self.conn.execute("DELETE FROM map_layouts", [])?;
        Ok(removed as u64)
    }
}
