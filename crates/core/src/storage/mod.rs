//! SQLite storage layer for Stallmap

mod layouts;
mod migrations;
mod parse;
mod records;
mod traits;

use rusqlite::Connection;
use std::path::Path;
use tracing::{info, instrument};

use crate::error::Result;
use crate::invariants::validate_layout;
use crate::models::{MapLayout, StallRecord};

pub use layouts::{LayoutStore, LayoutVersion};
pub use records::{RecordStore, SaveReport};
pub use traits::{LayoutRepository, RecordRepository, Storage};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    pub fn layouts(&self) -> LayoutStore<'_> {
        LayoutStore::new(&self.conn)
    }

    pub fn records(&self) -> RecordStore<'_> {
        RecordStore::new(&self.conn)
    }

    /// Validate a layout, store it as the newest version and sync the
    /// record table from its stall codes, all in one transaction
    #[instrument(skip(self, layout))]
    pub fn save_map(&self, layout: &MapLayout) -> Result<(i64, SaveReport)> {
        validate_layout(layout)?;

        let tx = self.conn.unchecked_transaction()?;
        let version = LayoutStore::new(&tx).save(layout)?;
        let report = RecordStore::new(&tx).upsert_from_layout(layout)?;
        tx.commit()?;

        info!(
            version,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "Map saved"
        );
        Ok((version, report))
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl LayoutRepository for Database {
    fn save_layout(&self, layout: &MapLayout) -> Result<i64> {
        self.layouts().save(layout)
    }

    fn latest_layout(&self) -> Result<Option<LayoutVersion>> {
        self.layouts().load_latest()
    }

    fn layout_versions(&self) -> Result<u64> {
        self.layouts().count()
    }

    fn delete_layouts(&self) -> Result<u64> {
        self.layouts().delete_all()
    }
}

impl RecordRepository for Database {
    fn list_records(&self) -> Result<Vec<StallRecord>> {
        self.records().list()
    }

    fn find_record(&self, name: &str) -> Result<Option<StallRecord>> {
        self.records().find_by_name(name)
    }

    fn sync_records(&self, layout: &MapLayout) -> Result<SaveReport> {
        self.records().upsert_from_layout(layout)
    }

    fn set_reserved(&self, name: &str, reserved: bool) -> Result<bool> {
        self.records().set_reserved(name, reserved)
    }

    fn set_genres(&self, name: &str, genres: &[&str]) -> Result<bool> {
        self.records().set_genres(name, genres)
    }

    fn clear_reservations(&self) -> Result<u64> {
        self.records().clear_reservations()
    }
}
