//! Stallmap Core Library
//!
//! Layout model, viewport math, stall matching, view rendering and storage
//! for the exhibition stall map.

pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod invariants;
pub mod layout;
pub mod matcher;
pub mod models;
pub mod render;
pub mod storage;
pub mod viewport;

pub use config::MapConfig;
pub use error::{Error, Result};
pub use geometry::{Bounds, Point, Size};
pub use grid::{grid_lines, snap, snap_point, GridLine, GridSnapper};
pub use invariants::validate_layout;
pub use layout::{GridSpec, HallNode, LayoutModel, MAX_GRID_STALLS};
pub use matcher::{MatchTier, MatchedHall, MatchedLayout, MatchedStall, Resolution, StallMatcher};
pub use models::*;
pub use render::{
    ClickOutcome, HallLabel, SizeFilter, StallSprite, StallStyle, ViewInput, ViewRenderer,
    ViewScene,
};
pub use storage::{
    Database, LayoutRepository, LayoutVersion, RecordRepository, SaveReport, Storage,
};
pub use viewport::{PanGesture, PointerButton, Viewport, ViewportMode};
