//! Map configuration loaded from `stallmap.toml`
//!
//! Every field is optional; missing fields and a missing file both fall back
//! to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Size;
use crate::grid::{GridSnapper, DEFAULT_PITCH};
use crate::matcher::StallMatcher;
use crate::viewport::{Viewport, ViewportMode, DEFAULT_CANVAS};

/// File name looked up in the data directory
pub const CONFIG_FILE: &str = "stallmap.toml";

/// Tunables for the designer and the view map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Canvas size in screen pixels
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Grid pitch in world units
    pub grid_pitch: f64,
    /// Snap drags and draws to the grid
    pub snap_enabled: bool,
    pub grid_visible: bool,
    /// Bind unmatched stalls to the record at the same index
    pub positional_fallback: bool,
    /// Most stalls one visitor may hold
    pub max_reservations: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS.width,
            canvas_height: DEFAULT_CANVAS.height,
            grid_pitch: DEFAULT_PITCH,
            snap_enabled: true,
            grid_visible: true,
            positional_fallback: true,
            max_reservations: 3,
        }
    }
}

impl MapConfig {
    /// Load from a TOML file, or defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn canvas(&self) -> Size {
        Size::new(self.canvas_width, self.canvas_height)
    }

    pub fn snapper(&self) -> GridSnapper {
        GridSnapper::new(self.grid_pitch, self.snap_enabled)
    }

    pub fn matcher(&self) -> StallMatcher {
        StallMatcher::new(self.positional_fallback)
    }

    pub fn viewport(&self, mode: ViewportMode) -> Viewport {
        Viewport::new(mode).with_canvas(self.canvas())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MapConfig::from_toml("grid_pitch = 10.0\npositional_fallback = false\n").unwrap();
        assert_eq!(config.grid_pitch, 10.0);
        assert!(!config.positional_fallback);
        assert_eq!(config.max_reservations, 3);
        assert_eq!(config.canvas(), Size::new(1200.0, 800.0));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = MapConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, MapConfig::default());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "snap_enabled = false\nmax_reservations = 5\n").unwrap();
        let config = MapConfig::load(&path).unwrap();
        assert!(!config.snapper().enabled);
        assert_eq!(config.max_reservations, 5);
    }

    #[test]
    fn test_bad_toml() {
        let err = MapConfig::from_toml("grid_pitch = \"wide\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
