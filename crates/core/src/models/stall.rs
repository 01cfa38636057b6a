//! Design-time stall model

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::HallId;
use crate::geometry::{Point, Size};

/// Default stall footprint
pub const DEFAULT_STALL_WIDTH: f64 = 80.0;
pub const DEFAULT_STALL_HEIGHT: f64 = 60.0;

/// Editor bounds for stall width and height
pub const MIN_STALL_EXTENT: f64 = 40.0;
pub const MAX_STALL_EXTENT: f64 = 200.0;

/// Opaque stall identifier (not the display code)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StallId(pub String);

impl StallId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(format!("stall-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Stall size category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StallSize {
    #[default]
    Small,
    Medium,
    Large,
    /// Anything the reservation service sends that we do not recognise
    Unknown,
}

impl StallSize {
    pub fn as_str(self) -> &'static str {
        match self {
            StallSize::Small => "SMALL",
            StallSize::Medium => "MEDIUM",
            StallSize::Large => "LARGE",
            StallSize::Unknown => "UNKNOWN",
        }
    }

    /// Size palette colour, `None` for unknown sizes
    pub fn default_color(self) -> Option<&'static str> {
        match self {
            StallSize::Small => Some("#ffeb3b"),
            StallSize::Medium => Some("#ff9800"),
            StallSize::Large => Some("#4caf50"),
            StallSize::Unknown => None,
        }
    }
}

impl From<String> for StallSize {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "SMALL" => StallSize::Small,
            "MEDIUM" => StallSize::Medium,
            "LARGE" => StallSize::Large,
            _ => StallSize::Unknown,
        }
    }
}

impl From<StallSize> for String {
    fn from(value: StallSize) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for StallSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Design-time availability flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StallStatus {
    #[default]
    Available,
    Reserved,
    Maintenance,
}

/// A stall rectangle as authored on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stall {
    pub id: StallId,
    /// Human display code, e.g. `A07`
    #[serde(rename = "stallId", default, deserialize_with = "super::null_as_default")]
    pub code: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub size: StallSize,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub color: String,
    #[serde(default)]
    pub status: StallStatus,
    pub hall_id: HallId,
}

impl Stall {
    /// Create a stall with default footprint and size-palette colour
    pub fn new(hall_id: HallId, code: String, position: Point, size: StallSize) -> Self {
        Self {
            id: StallId::generate(),
            code,
            x: position.x,
            y: position.y,
            width: DEFAULT_STALL_WIDTH,
            height: DEFAULT_STALL_HEIGHT,
            size,
            color: size.default_color().unwrap_or_default().to_string(),
            status: StallStatus::Available,
            hall_id,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn extent(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Display code, falling back to the opaque id
    pub fn display_code(&self) -> &str {
        if self.code.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.code
        }
    }

    /// Inclusive point-in-rectangle test in world coordinates
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Format a stall display code: `A01`..`A99`, then `A100`, `A101`, ...
pub fn format_stall_code(prefix: &str, sequence: usize) -> String {
    if sequence < 100 {
        format!("{}{:02}", prefix, sequence)
    } else {
        format!("{}{}", prefix, sequence)
    }
}

/// Clamp a width/height to the editor bounds
pub fn clamp_extent(value: f64) -> f64 {
    value.clamp(MIN_STALL_EXTENT, MAX_STALL_EXTENT)
}

/// Optional fields supplied when drawing a single stall
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StallOverrides {
    pub code: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
    pub status: Option<StallStatus>,
}

/// Partial update for an existing stall
///
/// `id`, `hall_id` are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StallPatch {
    pub code: Option<String>,
    pub size: Option<StallSize>,
    pub color: Option<String>,
    pub status: Option<StallStatus>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub position: Option<Point>,
}

impl StallPatch {
    pub fn is_empty(&self) -> bool {
        *self == StallPatch::default()
    }
}

fn default_width() -> f64 {
    DEFAULT_STALL_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_STALL_HEIGHT
}
