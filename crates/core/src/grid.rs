//! Grid snapping and grid-line generation

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Default grid pitch in world units
pub const DEFAULT_PITCH: f64 = 20.0;

fn usable(pitch: f64) -> bool {
    pitch.is_finite() && pitch > 0.0
}

/// Round `value` to the nearest multiple of `pitch`.
///
/// A non-positive or non-finite pitch leaves the value unchanged.
pub fn snap(value: f64, pitch: f64) -> f64 {
    if !usable(pitch) {
        return value;
    }
    (value / pitch).round() * pitch
}

/// Snap both coordinates independently
pub fn snap_point(point: Point, pitch: f64) -> Point {
    Point::new(snap(point.x, pitch), snap(point.y, pitch))
}

/// Snap settings of the design canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSnapper {
    pub pitch: f64,
    pub enabled: bool,
}

impl GridSnapper {
    pub fn new(pitch: f64, enabled: bool) -> Self {
        Self { pitch, enabled }
    }

    /// Snap if enabled, otherwise pass through
    pub fn apply(&self, point: Point) -> Point {
        if self.enabled {
            snap_point(point, self.pitch)
        } else {
            point
        }
    }
}

impl Default for GridSnapper {
    fn default() -> Self {
        Self::new(DEFAULT_PITCH, true)
    }
}

/// One renderable grid line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridLine {
    /// Line at `x`, spanning the full extent height
    Vertical(f64),
    /// Line at `y`, spanning the full extent width
    Horizontal(f64),
}

/// Lazy iterator over the grid lines of an extent.
///
/// Yields all vertical lines first, then all horizontal lines.
#[derive(Debug, Clone)]
pub struct GridLines {
    pitch: f64,
    width: f64,
    height: f64,
    next_vertical: u64,
    next_horizontal: u64,
}

/// Grid lines at `0, pitch, 2*pitch, ... <= extent` on both axes
pub fn grid_lines(extent_w: f64, extent_h: f64, pitch: f64) -> GridLines {
    GridLines {
        pitch,
        width: extent_w,
        height: extent_h,
        next_vertical: 0,
        next_horizontal: 0,
    }
}

impl Iterator for GridLines {
    type Item = GridLine;

    fn next(&mut self) -> Option<GridLine> {
        if !usable(self.pitch) {
            return None;
        }

        let x = self.next_vertical as f64 * self.pitch;
        if x <= self.width {
            self.next_vertical += 1;
            return Some(GridLine::Vertical(x));
        }

        let y = self.next_horizontal as f64 * self.pitch;
        if y <= self.height {
            self.next_horizontal += 1;
            return Some(GridLine::Horizontal(y));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_rounds_to_nearest() {
        assert_eq!(snap(53.0, 10.0), 50.0);
        assert_eq!(snap(77.0, 10.0), 80.0);
        assert_eq!(snap(118.0, 10.0), 120.0);
        assert_eq!(snap(-14.0, 10.0), -10.0);
    }

    #[test]
    fn test_bad_pitch_passes_through() {
        assert_eq!(snap(53.3, 0.0), 53.3);
        assert_eq!(snap(53.3, -5.0), 53.3);
        assert_eq!(snap(53.3, f64::NAN), 53.3);
    }

    #[test]
    fn test_snapper_disabled() {
        let snapper = GridSnapper::new(10.0, false);
        assert_eq!(snapper.apply(Point::new(53.0, 77.0)), Point::new(53.0, 77.0));
        let snapper = GridSnapper::new(10.0, true);
        assert_eq!(snapper.apply(Point::new(53.0, 77.0)), Point::new(50.0, 80.0));
    }

    #[test]
    fn test_grid_lines() {
        let lines: Vec<_> = grid_lines(40.0, 20.0, 20.0).collect();
        assert_eq!(
            lines,
            vec![
                GridLine::Vertical(0.0),
                GridLine::Vertical(20.0),
                GridLine::Vertical(40.0),
                GridLine::Horizontal(0.0),
                GridLine::Horizontal(20.0),
            ]
        );
    }

    #[test]
    fn test_grid_lines_count_for_canvas() {
        let count = grid_lines(1200.0, 800.0, 20.0).count();
        assert_eq!(count, 61 + 41);
    }

    #[test]
    fn test_no_lines_for_zero_pitch() {
        assert_eq!(grid_lines(100.0, 100.0, 0.0).count(), 0);
    }
}
