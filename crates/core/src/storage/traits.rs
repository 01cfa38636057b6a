//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, a remote reservation service).

use crate::error::Result;
use crate::models::{MapLayout, StallRecord};

use super::{LayoutVersion, SaveReport};

/// Layout version operations
pub trait LayoutRepository {
    /// Append a layout version, returning its id
    fn save_layout(&self, layout: &MapLayout) -> Result<i64>;

    /// Latest layout version
    fn latest_layout(&self) -> Result<Option<LayoutVersion>>;

    /// Number of stored layout versions
    fn layout_versions(&self) -> Result<u64>;

    /// Remove all layout versions
    fn delete_layouts(&self) -> Result<u64>;
}

/// Stall record operations
pub trait RecordRepository {
    /// All records in id order
    fn list_records(&self) -> Result<Vec<StallRecord>>;

    /// Find a record by its display name
    fn find_record(&self, name: &str) -> Result<Option<StallRecord>>;

    /// Create or refresh records from a layout's stall codes
    fn sync_records(&self, layout: &MapLayout) -> Result<SaveReport>;

    /// Mark a record reserved or free
    fn set_reserved(&self, name: &str, reserved: bool) -> Result<bool>;

    /// Replace a record's genre tags
    fn set_genres(&self, name: &str, genres: &[&str]) -> Result<bool>;

    /// Release every reservation
    fn clear_reservations(&self) -> Result<u64>;
}

/// Combined storage trait
pub trait Storage: LayoutRepository + RecordRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where T: LayoutRepository + RecordRepository {}
