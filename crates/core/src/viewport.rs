//! Viewport - the pan/zoom transform between screen pixels and world units
//!
//! `to_world(p) = (p - offset) / scale`, `to_screen(p) = p * scale + offset`.
//! Scale is always kept inside the bounds of the viewport's [`ViewportMode`].

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point, Size};

/// Multiplicative step applied per wheel notch
pub const ZOOM_FACTOR: f64 = 1.1;

/// Additive step used by the zoom buttons
pub const ZOOM_STEP: f64 = 0.1;

/// World units left around content by fit-to-content
pub const FIT_MARGIN: f64 = 50.0;

/// Canvas size used when configuration does not say otherwise
pub const DEFAULT_CANVAS: Size = Size::new(1200.0, 800.0);

/// Which canvas the viewport belongs to; decides the zoom range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewportMode {
    /// Organizer's editing canvas
    Design,
    /// Visitor's read-only canvas
    View,
}

impl ViewportMode {
    /// Inclusive `(min, max)` scale bounds
    pub fn scale_bounds(self) -> (f64, f64) {
        match self {
            ViewportMode::Design => (0.1, 5.0),
            ViewportMode::View => (0.5, 2.0),
        }
    }
}

/// Pan/zoom state of one canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    scale: f64,
    offset: Point,
    mode: ViewportMode,
    canvas: Size,
}

impl Viewport {
    pub fn new(mode: ViewportMode) -> Self {
        Self {
            scale: 1.0,
            offset: Point::ORIGIN,
            mode,
            canvas: DEFAULT_CANVAS,
        }
    }

    pub fn with_canvas(mut self, canvas: Size) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn mode(&self) -> ViewportMode {
        self.mode
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Zoom level as a whole percentage, for the on-canvas indicator
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        let (min, max) = self.mode.scale_bounds();
        if scale.is_nan() {
            return self.scale;
        }
        scale.clamp(min, max)
    }

    /// Wheel zoom centred on the pointer.
    ///
    /// A positive delta (wheel down) zooms out. The world point under
    /// `pointer` stays under it.
    pub fn zoom(&mut self, pointer: Point, wheel_delta: f64) {
        let target = if wheel_delta > 0.0 {
            self.scale / ZOOM_FACTOR
        } else {
            self.scale * ZOOM_FACTOR
        };
        self.zoom_at(pointer, target);
    }

    /// Set the scale (clamped) keeping the world point under `pointer` fixed
    pub fn zoom_at(&mut self, pointer: Point, scale: f64) {
        let world = self.to_world(pointer);
        let scale = self.clamp_scale(scale);
        self.scale = scale;
        self.offset = pointer - world * scale;
    }

    /// Button zoom in; offset is left alone
    pub fn zoom_in(&mut self) {
        self.scale = self.clamp_scale(self.scale + ZOOM_STEP);
    }

    /// Button zoom out; offset is left alone
    pub fn zoom_out(&mut self) {
        self.scale = self.clamp_scale(self.scale - ZOOM_STEP);
    }

    pub fn pan(&mut self, delta: Point) {
        self.offset = self.offset + delta;
    }

    pub fn to_world(&self, screen: Point) -> Point {
        (screen - self.offset) / self.scale
    }

    pub fn to_screen(&self, world: Point) -> Point {
        world * self.scale + self.offset
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.offset = Point::ORIGIN;
    }

    /// Scale and shift so `bounds` fits the canvas with [`FIT_MARGIN`] around it.
    ///
    /// Never zooms in past 1:1.
    pub fn fit_to_content(&mut self, bounds: Bounds) {
        let margin = FIT_MARGIN * 2.0;
        let scale_x = self.canvas.width / (bounds.width() + margin);
        let scale_y = self.canvas.height / (bounds.height() + margin);
        let scale = self.clamp_scale(scale_x.min(scale_y).min(1.0));

        self.scale = scale;
        self.offset = Point::new(
            -bounds.min.x * scale + FIT_MARGIN,
            -bounds.min.y * scale + FIT_MARGIN,
        );
    }
}

/// Pointer buttons the canvases care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Pan gesture tracker.
///
/// Active between a qualifying press and the matching release. The release
/// that ends a pan never counts as a click.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanGesture {
    last: Option<Point>,
}

impl PanGesture {
    /// Middle button always pans; primary pans with the modifier held when
    /// the caller allows it (select tool in design mode, always in view mode).
    pub fn should_start(button: PointerButton, modifier: bool, primary_allowed: bool) -> bool {
        match button {
            PointerButton::Middle => true,
            PointerButton::Primary => modifier && primary_allowed,
            PointerButton::Secondary => false,
        }
    }

    pub fn begin(&mut self, at: Point) {
        self.last = Some(at);
    }

    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }

    /// Apply pointer movement to the viewport; returns false when not panning
    pub fn update(&mut self, at: Point, viewport: &mut Viewport) -> bool {
        let Some(last) = self.last else {
            return false;
        };
        let delta = at - last;
        if delta != Point::ORIGIN {
            viewport.pan(delta);
        }
        self.last = Some(at);
        true
    }

    /// End the gesture; returns true if one was active
    pub fn end(&mut self) -> bool {
        self.last.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_round_trip_conversion() {
        let mut vp = Viewport::new(ViewportMode::Design);
        vp.zoom_at(Point::new(100.0, 100.0), 2.0);
        vp.pan(Point::new(15.0, -5.0));

        let world = Point::new(42.0, 17.5);
        let back = vp.to_world(vp.to_screen(world));
        assert!(back.distance(world) < EPS);
    }

    #[test]
    fn test_wheel_direction() {
        let mut vp = Viewport::new(ViewportMode::Design);
        vp.zoom(Point::ORIGIN, -1.0);
        assert!((vp.scale() - 1.1).abs() < EPS);

        vp.reset();
        vp.zoom(Point::ORIGIN, 1.0);
        assert!((vp.scale() - 1.0 / 1.1).abs() < EPS);
    }

    #[test]
    fn test_zoom_keeps_pointer_anchor() {
        let mut vp = Viewport::new(ViewportMode::Design);
        vp.pan(Point::new(30.0, 40.0));
        let pointer = Point::new(400.0, 250.0);
        let before = vp.to_world(pointer);

        vp.zoom(pointer, -120.0);
        let after = vp.to_world(pointer);

        assert!(before.distance(after) < EPS);
    }

    #[test]
    fn test_scale_bounds_per_mode() {
        let mut design = Viewport::new(ViewportMode::Design);
        let mut view = Viewport::new(ViewportMode::View);
        for _ in 0..100 {
            design.zoom(Point::ORIGIN, -1.0);
            view.zoom(Point::ORIGIN, -1.0);
        }
        assert_eq!(design.scale(), 5.0);
        assert_eq!(view.scale(), 2.0);

        for _ in 0..200 {
            design.zoom(Point::ORIGIN, 1.0);
            view.zoom(Point::ORIGIN, 1.0);
        }
        assert_eq!(design.scale(), 0.1);
        assert_eq!(view.scale(), 0.5);
    }

    #[test]
    fn test_button_zoom_leaves_offset() {
        let mut vp = Viewport::new(ViewportMode::View);
        vp.pan(Point::new(10.0, 10.0));
        vp.zoom_in();
        assert!((vp.scale() - 1.1).abs() < EPS);
        assert_eq!(vp.offset(), Point::new(10.0, 10.0));
        assert_eq!(vp.zoom_percent(), 110);
    }

    #[test]
    fn test_fit_to_content() {
        let mut vp = Viewport::new(ViewportMode::Design);
        let bounds = Bounds::from_rect(Point::new(100.0, 100.0), Size::new(2300.0, 700.0));
        vp.fit_to_content(bounds);

        // 1200 / 2400 = 0.5, 800 / 800 = 1.0
        assert!((vp.scale() - 0.5).abs() < EPS);
        assert_eq!(vp.offset(), Point::new(0.0, 0.0));
        let top_left = vp.to_screen(bounds.min);
        assert!((top_left.x - FIT_MARGIN).abs() < EPS);
    }

    #[test]
    fn test_fit_never_zooms_past_one() {
        let mut vp = Viewport::new(ViewportMode::Design);
        vp.fit_to_content(Bounds::from_rect(Point::new(0.0, 0.0), Size::new(10.0, 10.0)));
        assert_eq!(vp.scale(), 1.0);
        assert_eq!(vp.offset(), Point::new(FIT_MARGIN, FIT_MARGIN));
    }

    #[test]
    fn test_pan_gesture() {
        assert!(PanGesture::should_start(PointerButton::Middle, false, false));
        assert!(PanGesture::should_start(PointerButton::Primary, true, true));
        assert!(!PanGesture::should_start(PointerButton::Primary, true, false));
        assert!(!PanGesture::should_start(PointerButton::Primary, false, true));

        let mut vp = Viewport::new(ViewportMode::View);
        let mut pan = PanGesture::default();
        assert!(!pan.update(Point::new(5.0, 5.0), &mut vp));

        pan.begin(Point::new(10.0, 10.0));
        assert!(pan.update(Point::new(25.0, 5.0), &mut vp));
        assert_eq!(vp.offset(), Point::new(15.0, -5.0));
        assert!(pan.end());
        assert!(!pan.is_active());
        assert!(!pan.end());
    }
}
