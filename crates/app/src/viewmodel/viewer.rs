//! Visitor map view model - hover, reservation cart and size filter

use std::collections::HashSet;

use stallmap_core::{
    Bounds, ClickOutcome, MapConfig, MatchedLayout, PanGesture, Point, PointerButton, RecordId,
    SizeFilter, StallId, StallRecord, ViewInput, ViewRenderer, ViewScene, Viewport, ViewportMode,
};
use tracing::debug;

/// Reservations a visitor may hold when configuration does not say
pub const DEFAULT_MAX_RESERVATIONS: usize = 3;

/// Result of toggling a record in the cart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    Added,
    Removed,
    /// Someone already holds the stall
    RejectedReserved,
    /// Selections plus existing reservations would exceed the limit
    RejectedFull { limit: usize },
}

/// Records the visitor picked but has not reserved yet
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationCart {
    max: usize,
    existing: usize,
    selected: Vec<StallRecord>,
    ids: HashSet<RecordId>,
}

impl Default for ReservationCart {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESERVATIONS, 0)
    }
}

impl ReservationCart {
    /// `existing` counts reservations the visitor already holds
    pub fn new(max: usize, existing: usize) -> Self {
        Self {
            max,
            existing,
            selected: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub fn toggle(&mut self, record: &StallRecord) -> CartChange {
        if record.reserved {
            return CartChange::RejectedReserved;
        }
        if self.ids.remove(&record.id) {
            self.selected.retain(|r| r.id != record.id);
            return CartChange::Removed;
        }
        if self.selected.len() + self.existing >= self.max {
            return CartChange::RejectedFull { limit: self.max };
        }
        self.ids.insert(record.id.clone());
        self.selected.push(record.clone());
        CartChange::Added
    }

    /// Selections still allowed
    pub fn remaining(&self) -> usize {
        self.max.saturating_sub(self.existing + self.selected.len())
    }

    pub fn selected(&self) -> &[StallRecord] {
        &self.selected
    }

    pub fn ids(&self) -> &HashSet<RecordId> {
        &self.ids
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    /// Empty the cart, e.g. after the reservations were confirmed
    pub fn clear(&mut self) {
        self.selected.clear();
        self.ids.clear();
    }
}

/// Visitor map inputs
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    PointerDown {
        screen: Point,
        button: PointerButton,
        /// Shift held
        modifier: bool,
    },
    PointerMove { screen: Point },
    PointerUp { screen: Point },
    PointerLeave,
    Wheel { screen: Point, delta: f64 },
    SetSizeFilter(SizeFilter),
    ZoomIn,
    ZoomOut,
    ResetView,
    FitToContent,
}

/// Messages for the visitor after an event
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerNotice {
    Selected(StallRecord),
    Deselected(StallRecord),
    /// The stall has no record behind it
    NotAvailable(String),
    AlreadyReserved(String),
    LimitReached { limit: usize, existing: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub viewport: Viewport,
    pub pan: PanGesture,
    pub hovered: Option<RecordId>,
    pub cart: ReservationCart,
    pub size_filter: SizeFilter,
    press: Option<StallPress>,
}

/// Primary press on a stall; it only counts as a click when released on the
/// same stall without moving
#[derive(Debug, Clone, PartialEq)]
struct StallPress {
    stall: StallId,
    screen: Point,
    moved: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(&MapConfig::default(), 0)
    }
}

impl ViewerState {
    pub fn new(config: &MapConfig, existing_reservations: usize) -> Self {
        Self {
            viewport: config.viewport(ViewportMode::View),
            pan: PanGesture::default(),
            hovered: None,
            cart: ReservationCart::new(config.max_reservations, existing_reservations),
            size_filter: SizeFilter::All,
            press: None,
        }
    }

    pub fn handle(
        &mut self,
        event: ViewerEvent,
        layout: Option<&MatchedLayout>,
    ) -> Option<ViewerNotice> {
        match event {
            ViewerEvent::PointerDown {
                screen,
                button,
                modifier,
            } => {
                self.press = None;
                let world = self.viewport.to_world(screen);
                let hit = layout.and_then(|l| l.hit_test(world));
                // Primary drags on empty canvas pan the visitor map too
                let pans = PanGesture::should_start(button, modifier, true)
                    || (button == PointerButton::Primary && hit.is_none());
                if pans {
                    self.pan.begin(screen);
                } else if let (PointerButton::Primary, Some(stall)) = (button, hit) {
                    self.press = Some(StallPress {
                        stall: stall.stall.id.clone(),
                        screen,
                        moved: false,
                    });
                }
                None
            }
            ViewerEvent::PointerMove { screen } => {
                if let Some(press) = self.press.as_mut() {
                    press.moved |= screen != press.screen;
                }
                if !self.pan.update(screen, &mut self.viewport) {
                    let world = self.viewport.to_world(screen);
                    self.hovered = layout
                        .and_then(|l| l.hit_test(world))
                        .and_then(|s| s.record())
                        .map(|r| r.id.clone());
                }
                None
            }
            ViewerEvent::PointerUp { screen } => {
                if self.pan.end() {
                    return None;
                }
                let press = self.press.take()?;
                if press.moved || screen != press.screen {
                    return None;
                }
                let world = self.viewport.to_world(screen);
                let hit = layout
                    .and_then(|l| l.hit_test(world))
                    .filter(|s| s.stall.id == press.stall);
                self.click(ViewRenderer::click(hit))
            }
            ViewerEvent::PointerLeave => {
                self.hovered = None;
                self.pan.end();
                self.press = None;
                None
            }
            ViewerEvent::Wheel { screen, delta } => {
                self.viewport.zoom(screen, delta);
                None
            }
            ViewerEvent::SetSizeFilter(filter) => {
                self.size_filter = filter;
                None
            }
            ViewerEvent::ZoomIn => {
                self.viewport.zoom_in();
                None
            }
            ViewerEvent::ZoomOut => {
                self.viewport.zoom_out();
                None
            }
            ViewerEvent::ResetView => {
                self.viewport.reset();
                None
            }
            ViewerEvent::FitToContent => {
                let bounds = layout.and_then(|l| {
                    l.stalls()
                        .map(|s| Bounds::from_rect(s.stall.position(), s.stall.extent()))
                        .reduce(Bounds::union)
                });
                if let Some(bounds) = bounds {
                    self.viewport.fit_to_content(bounds);
                }
                None
            }
        }
    }

    fn click(&mut self, outcome: ClickOutcome) -> Option<ViewerNotice> {
        match outcome {
            ClickOutcome::Inert => None,
            ClickOutcome::NotAvailable(display_id) => Some(ViewerNotice::NotAvailable(display_id)),
            ClickOutcome::Forward(record) => {
                let change = self.cart.toggle(&record);
                debug!(record = %record.id, ?change, "Toggled reservation cart");
                match change {
                    CartChange::Added => Some(ViewerNotice::Selected(record)),
                    CartChange::Removed => Some(ViewerNotice::Deselected(record)),
                    CartChange::RejectedReserved => Some(ViewerNotice::AlreadyReserved(record.name)),
                    CartChange::RejectedFull { limit } => Some(ViewerNotice::LimitReached {
                        limit,
                        existing: self.cart.existing,
                    }),
                }
            }
        }
    }

    /// Render the map with the current cart, hover and filter
    pub fn scene(&self, layout: Option<&MatchedLayout>) -> ViewScene {
        ViewRenderer::render(&ViewInput {
            layout,
            selection: self.cart.ids(),
            hovered: self.hovered.as_ref(),
            size_filter: self.size_filter,
        })
    }
}
