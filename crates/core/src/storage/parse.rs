//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Error as SqlError;

use crate::models::{MapLayout, RecordId, StallRecord, StallSize};

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SqlError::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Parse a stored layout JSON document
pub fn parse_layout(s: &str) -> Result<MapLayout, SqlError> {
    MapLayout::from_json(s).map_err(|e| SqlError::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Map a `stall_records` row selected as `id, name, size, reserved, genres`
pub fn record_from_row(row: &rusqlite::Row<'_>) -> Result<StallRecord, SqlError> {
    let id: i64 = row.get(0)?;
    let size: String = row.get(2)?;
    Ok(StallRecord {
        id: RecordId::from(id),
        name: row.get(1)?,
        size: StallSize::from(size),
        reserved: row.get(3)?,
        genres: row.get(4)?,
    })
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
