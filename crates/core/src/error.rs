//! Error types for Stallmap Core

use thiserror::Error;

use crate::models::{HallId, StallId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Hall not found: {0}")]
    HallNotFound(HallId),

    #[error("Stall not found: {0}")]
    StallNotFound(StallId),

    #[error("A hall named '{0}' already exists")]
    DuplicateHallName(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Layout has no stalls")]
    EmptyLayout,

    #[error("Failed to fetch map layout: {0}")]
    LayoutFetch(String),

    #[error("Failed to fetch stall records: {0}")]
    RecordFetch(String),

    #[error("Save conflict: {0}")]
    SaveConflict(String),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
