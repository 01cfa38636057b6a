//! Stall record storage

use std::collections::HashSet;

use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::parse::{record_from_row, OptionalExt};
use crate::error::Result;
use crate::models::{MapLayout, StallRecord, StallSize};

/// Outcome of syncing records from a saved layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub struct RecordStore<'a> {
    conn: &'a Connection,
}

impl<'a> RecordStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All records in id order
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<StallRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, size, reserved, genres FROM stall_records ORDER BY id")?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    #[instrument(skip(self))]
    pub fn find_by_name(&self, name: &str) -> Result<Option<StallRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, name, size, reserved, genres FROM stall_records WHERE name = ?1",
                params![name],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Create or refresh one record per stall display code.
    ///
    /// Existing records keep their reserved flag and genres; only the size
    /// follows the layout. Stalls without any code, and repeats of a code
    /// already synced in this layout, are skipped; the first stall with a
    /// code decides its size.
    #[instrument(skip(self, layout), fields(stalls = layout.stall_count()))]
    pub fn upsert_from_layout(&self, layout: &MapLayout) -> Result<SaveReport> {
        let mut report = SaveReport::default();
        let mut seen = HashSet::new();

        for stall in layout.stalls() {
            let name = stall.display_code().trim();
            if name.is_empty() {
                warn!("Skipping stall without a code");
                report.skipped += 1;
                continue;
            }
            if !seen.insert(name) {
                debug!(code = name, "Skipping repeated stall code");
                report.skipped += 1;
                continue;
            }
            let size = match stall.size {
                StallSize::Unknown => StallSize::Small,
                known => known,
            };

            let updated = self.conn.execute(
                "UPDATE stall_records SET size = ?1 WHERE name = ?2",
                params![size.as_str(), name],
            )?;
            if updated > 0 {
                report.updated += 1;
            } else {
                self.conn.execute(
                    "INSERT INTO stall_records (name, size, reserved, genres) VALUES (?1, ?2, 0, '')",
                    params![name, size.as_str()],
                )?;
                report.created += 1;
            }
        }

        debug!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "Synced stall records from layout"
        );
        Ok(report)
    }

    /// Returns false when no record has that name
    #[instrument(skip(self))]
    pub fn set_reserved(&self, name: &str, reserved: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE stall_records SET reserved = ?1 WHERE name = ?2",
            params![reserved, name],
        )?;
        Ok(changed > 0)
    }

    /// Store a comma-joined genre list; returns false when no record has that name
    #[instrument(skip(self, genres))]
    pub fn set_genres(&self, name: &str, genres: &[&str]) -> Result<bool> {
        let joined = genres
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let changed = self.conn.execute(
            "UPDATE stall_records SET genres = ?1 WHERE name = ?2",
            params![joined, name],
        )?;
        Ok(changed > 0)
    }

    /// Release every reservation; returns how many records were reserved
    #[instrument(skip(self))]
    pub fn clear_reservations(&self) -> Result<u64> {
        let changed = self
            .conn
            .execute("UPDATE stall_records SET reserved = 0 WHERE reserved = 1", [])?;
        Ok(changed as u64)
    }
}
