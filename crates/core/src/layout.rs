//! Layout model - the hall/stall tree held by the designer
//!
//! Halls and stalls live in flat id-keyed maps; each hall keeps the ordered
//! list of its stall ids. Every operation returns a new snapshot and leaves
//! `self` untouched. Snapshots share all entries that an operation did not
//! touch, so producing one costs a shallow copy of the top-level maps.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::geometry::{Bounds, Point, Size};
use crate::invariants::{assert_layout_invariants, validate_layout};
use crate::models::{
    clamp_extent, format_stall_code, hall_prefix, Hall, HallId, MapLayout, Stall, StallId,
    StallOverrides, StallPatch, StallSize, DEFAULT_LABEL_X, DEFAULT_LABEL_Y,
    DEFAULT_STALL_HEIGHT, DEFAULT_STALL_WIDTH,
};

/// Approximate glyph advance of the 24px hall label font
const LABEL_CHAR_WIDTH: f64 = 14.0;
const LABEL_PADDING: f64 = 5.0;
const LABEL_HEIGHT: f64 = 32.0;

/// Largest grid a single insert may create
pub const MAX_GRID_STALLS: u32 = 2_500;

/// A hall inside the arena
#[derive(Debug, Clone, PartialEq)]
pub struct HallNode {
    pub id: HallId,
    pub name: String,
    pub label: Point,
    stalls: Vec<StallId>,
}

impl HallNode {
    fn new(id: HallId, name: String) -> Self {
        Self {
            id,
            name,
            label: Point::new(DEFAULT_LABEL_X, DEFAULT_LABEL_Y),
            stalls: Vec::new(),
        }
    }

    /// Stall ids in drawing order
    pub fn stall_ids(&self) -> &[StallId] {
        &self.stalls
    }

    pub fn prefix(&self) -> char {
        hall_prefix(&self.name)
    }

    /// Screen-independent hit box of the label background
    pub fn label_bounds(&self) -> Bounds {
        let origin = Point::new(self.label.x - LABEL_PADDING, self.label.y - LABEL_PADDING);
        let width = self.name.chars().count() as f64 * LABEL_CHAR_WIDTH + LABEL_PADDING * 2.0;
        Bounds::from_rect(origin, Size::new(width, LABEL_HEIGHT))
    }
}

/// Parameters of a bulk grid insert
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// Code prefix; empty means "use the hall's prefix"
    pub prefix: String,
    pub rows: u32,
    pub cols: u32,
    pub size: StallSize,
    pub cell: Size,
    pub spacing: f64,
    pub origin: Point,
}

impl GridSpec {
    pub fn new(prefix: impl Into<String>, rows: u32, cols: u32, size: StallSize) -> Self {
        Self {
            prefix: prefix.into(),
            rows,
            cols,
            size,
            ..Self::default()
        }
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            prefix: "A".to_string(),
            rows: 3,
            cols: 8,
            size: StallSize::Small,
            cell: Size::new(DEFAULT_STALL_WIDTH, DEFAULT_STALL_HEIGHT),
            spacing: 10.0,
            origin: Point::new(50.0, 50.0),
        }
    }
}

/// Immutable snapshot of the layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutModel {
    order: Arc<Vec<HallId>>,
    halls: Arc<HashMap<HallId, Arc<HallNode>>>,
    stalls: Arc<HashMap<StallId, Arc<Stall>>>,
}

impl LayoutModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the persisted shape, rejecting orphaned or duplicated entries
    pub fn from_layout(layout: &MapLayout) -> Result<Self> {
        validate_layout(layout)?;

        let mut order = Vec::with_capacity(layout.halls.len());
        let mut halls = HashMap::with_capacity(layout.halls.len());
        let mut stalls = HashMap::with_capacity(layout.stall_count());

        for hall in &layout.halls {
            let mut node = HallNode::new(hall.id.clone(), hall.name.clone());
            node.label = Point::new(hall.label_x, hall.label_y);
            for stall in &hall.stalls {
                node.stalls.push(stall.id.clone());
                stalls.insert(stall.id.clone(), Arc::new(stall.clone()));
            }
            order.push(hall.id.clone());
            halls.insert(hall.id.clone(), Arc::new(node));
        }

        Ok(Self {
            order: Arc::new(order),
            halls: Arc::new(halls),
            stalls: Arc::new(stalls),
        }
        .checked())
    }

    /// Produce the persisted shape, halls and stalls in order
    pub fn to_layout(&self) -> MapLayout {
        let halls = self
            .halls()
            .map(|node| Hall {
                id: node.id.clone(),
                name: node.name.clone(),
                label_x: node.label.x,
                label_y: node.label.y,
                stalls: node
                    .stalls
                    .iter()
                    .filter_map(|id| self.stalls.get(id))
                    .map(|s| s.as_ref().clone())
                    .collect(),
            })
            .collect();
        MapLayout::new(halls)
    }

    fn checked(self) -> Self {
        assert_layout_invariants(&self);
        self
    }

    // ---- queries -------------------------------------------------------

    /// Halls in insertion order
    pub fn halls(&self) -> impl Iterator<Item = &HallNode> {
        self.order
            .iter()
            .filter_map(|id| self.halls.get(id).map(|h| h.as_ref()))
    }

    pub fn hall(&self, id: &HallId) -> Option<&HallNode> {
        self.halls.get(id).map(|h| h.as_ref())
    }

    pub fn first_hall(&self) -> Option<&HallNode> {
        self.halls().next()
    }

    /// Find a hall by its trimmed name
    pub fn find_hall_by_name(&self, name: &str) -> Option<&HallNode> {
        let name = name.trim();
        self.halls().find(|h| h.name.trim() == name)
    }

    pub fn stall(&self, id: &StallId) -> Option<&Stall> {
        self.stalls.get(id).map(|s| s.as_ref())
    }

    /// Stalls of one hall in drawing order
    pub fn stalls_in<'a>(&'a self, hall_id: &HallId) -> impl Iterator<Item = &'a Stall> + 'a {
        self.hall(hall_id)
            .into_iter()
            .flat_map(|h| h.stalls.iter())
            .filter_map(move |id| self.stall(id))
    }

    /// All stalls, hall by hall, in drawing order
    pub fn all_stalls(&self) -> impl Iterator<Item = &Stall> {
        self.halls()
            .flat_map(|h| h.stalls.iter())
            .filter_map(move |id| self.stall(id))
    }

    pub fn hall_count(&self) -> usize {
        self.order.len()
    }

    pub fn stall_count(&self) -> usize {
        self.stalls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn has_stalls(&self) -> bool {
        !self.stalls.is_empty()
    }

    /// Bounding box of every stall, `None` without stalls
    pub fn bounds(&self) -> Option<Bounds> {
        self.all_stalls()
            .map(|s| Bounds::from_rect(s.position(), s.extent()))
            .reduce(Bounds::union)
    }

    /// Topmost stall under a world point (later stalls draw on top)
    pub fn hit_test(&self, world: Point) -> Option<&Stall> {
        self.all_stalls().filter(|s| s.contains(world)).last()
    }

    /// Hall whose label box contains the world point
    pub fn hit_test_label(&self, world: Point) -> Option<&HallNode> {
        self.halls()
            .filter(|h| h.label_bounds().contains(world))
            .last()
    }

    fn require_hall(&self, id: &HallId) -> Result<&HallNode> {
        self.hall(id).ok_or_else(|| Error::HallNotFound(id.clone()))
    }

    fn require_stall(&self, id: &StallId) -> Result<&Stall> {
        self.stall(id).ok_or_else(|| Error::StallNotFound(id.clone()))
    }

    fn ensure_unique_name(&self, name: &str, except: Option<&HallId>) -> Result<()> {
        let clash = self
            .halls()
            .any(|h| h.name.trim() == name && Some(&h.id) != except);
        if clash {
            return Err(Error::DuplicateHallName(name.to_string()));
        }
        Ok(())
    }

    // ---- mutations -----------------------------------------------------

    /// Append a new, empty hall
    pub fn add_hall(&self, name: &str) -> Result<(Self, HallId)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidOperation("Hall name is empty".into()));
        }
        self.ensure_unique_name(name, None)?;

        let id = HallId::generate();
        let mut next = self.clone();
        Arc::make_mut(&mut next.order).push(id.clone());
        Arc::make_mut(&mut next.halls).insert(
            id.clone(),
            Arc::new(HallNode::new(id.clone(), name.to_string())),
        );
        Ok((next.checked(), id))
    }

    /// Rename a hall. Existing stall codes keep their old prefix.
    pub fn rename_hall(&self, hall_id: &HallId, name: &str) -> Result<Self> {
        let node = self.require_hall(hall_id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidOperation("Hall name is empty".into()));
        }
        self.ensure_unique_name(name, Some(hall_id))?;

        let mut node = node.clone();
        node.name = name.to_string();
        Ok(self.replace_hall(node))
    }

    /// Draw one stall; its code continues the hall's numbering
    pub fn add_stall(
        &self,
        hall_id: &HallId,
        position: Point,
        size: StallSize,
        overrides: StallOverrides,
    ) -> Result<(Self, StallId)> {
        let node = self.require_hall(hall_id)?;

        let code = match overrides.code {
            Some(code) if !code.trim().is_empty() => code.trim().to_string(),
            _ => format_stall_code(&node.prefix().to_string(), node.stalls.len() + 1),
        };

        let mut stall = Stall::new(hall_id.clone(), code, position.clamp_non_negative(), size);
        if let Some(width) = overrides.width {
            stall.width = clamp_extent(width);
        }
        if let Some(height) = overrides.height {
            stall.height = clamp_extent(height);
        }
        if let Some(color) = overrides.color {
            stall.color = color;
        }
        if let Some(status) = overrides.status {
            stall.status = status;
        }

        let stall_id = stall.id.clone();
        let next = self.insert_stalls(node, vec![stall]);
        Ok((next, stall_id))
    }

    /// Insert `rows * cols` stalls in row-major order, numbered
    /// `1..=rows*cols`.
    ///
    /// Numbering always restarts at 1, so a second grid with the same prefix
    /// repeats existing codes. At most [`MAX_GRID_STALLS`] stalls per insert.
    pub fn add_stall_grid(&self, hall_id: &HallId, spec: &GridSpec) -> Result<(Self, Vec<StallId>)> {
        let node = self.require_hall(hall_id)?;
        if spec.rows == 0 || spec.cols == 0 {
            return Err(Error::InvalidOperation(format!(
                "Grid must have at least one row and column, got {}x{}",
                spec.rows, spec.cols
            )));
        }
        let total = spec
            .rows
            .checked_mul(spec.cols)
            .filter(|n| *n <= MAX_GRID_STALLS)
            .ok_or_else(|| {
                Error::InvalidOperation(format!(
                    "Grid of {}x{} exceeds {} stalls",
                    spec.rows, spec.cols, MAX_GRID_STALLS
                ))
            })?;

        let prefix = match spec.prefix.trim() {
            "" => node.prefix().to_string(),
            p => p.to_uppercase(),
        };

        let step_x = spec.cell.width + spec.spacing;
        let step_y = spec.cell.height + spec.spacing;
        let mut batch = Vec::with_capacity(total as usize);
        for row in 0..spec.rows {
            for col in 0..spec.cols {
                // bounded by `total`
                let sequence = (row * spec.cols + col) as usize + 1;
                let position = Point::new(
                    spec.origin.x + col as f64 * step_x,
                    spec.origin.y + row as f64 * step_y,
                );
                let mut stall = Stall::new(
                    hall_id.clone(),
                    format_stall_code(&prefix, sequence),
                    position.clamp_non_negative(),
                    spec.size,
                );
                stall.width = spec.cell.width;
                stall.height = spec.cell.height;
                batch.push(stall);
            }
        }

        let ids = batch.iter().map(|s| s.id.clone()).collect();
        Ok((self.insert_stalls(node, batch), ids))
    }

    /// Replace a stall's position; callers snap beforehand
    pub fn move_stall(&self, stall_id: &StallId, position: Point) -> Result<Self> {
        let mut stall = self.require_stall(stall_id)?.clone();
        let position = position.clamp_non_negative();
        stall.x = position.x;
        stall.y = position.y;
        Ok(self.replace_stall(stall))
    }

    /// Replace a hall label's anchor
    pub fn move_hall_label(&self, hall_id: &HallId, position: Point) -> Result<Self> {
        let mut node = self.require_hall(hall_id)?.clone();
        node.label = position.clamp_non_negative();
        Ok(self.replace_hall(node))
    }

    /// Merge a partial update into a stall.
    ///
    /// A size change without an explicit colour recolours from the size
    /// palette. Width and height are clamped to the editor bounds.
    pub fn update_stall(&self, stall_id: &StallId, patch: &StallPatch) -> Result<Self> {
        let mut stall = self.require_stall(stall_id)?.clone();

        if let Some(code) = &patch.code {
            let code = code.trim();
            if code.is_empty() {
                return Err(Error::InvalidOperation("Stall code is empty".into()));
            }
            stall.code = code.to_string();
        }
        if let Some(size) = patch.size {
            if size != stall.size && patch.color.is_none() {
                if let Some(color) = size.default_color() {
                    stall.color = color.to_string();
                }
            }
            stall.size = size;
        }
        if let Some(color) = &patch.color {
            stall.color = color.clone();
        }
        if let Some(status) = patch.status {
            stall.status = status;
        }
        if let Some(width) = patch.width {
            stall.width = clamp_extent(width);
        }
        if let Some(height) = patch.height {
            stall.height = clamp_extent(height);
        }
        if let Some(position) = patch.position {
            let position = position.clamp_non_negative();
            stall.x = position.x;
            stall.y = position.y;
        }

        Ok(self.replace_stall(stall))
    }

    /// Remove a stall; unknown ids leave the model as it was
    pub fn delete_stall(&self, stall_id: &StallId) -> Self {
        let Some(stall) = self.stall(stall_id) else {
            return self.clone();
        };

        let mut next = self.clone();
        if let Some(node) = self.hall(&stall.hall_id) {
            let mut node = node.clone();
            node.stalls.retain(|id| id != stall_id);
            Arc::make_mut(&mut next.halls).insert(node.id.clone(), Arc::new(node));
        }
        Arc::make_mut(&mut next.stalls).remove(stall_id);
        next.checked()
    }

    /// Remove a hall and all of its stalls; unknown ids are a no-op
    pub fn delete_hall(&self, hall_id: &HallId) -> Self {
        let Some(node) = self.hall(hall_id) else {
            return self.clone();
        };

        let mut next = self.clone();
        let stalls = Arc::make_mut(&mut next.stalls);
        for id in &node.stalls {
            stalls.remove(id);
        }
        Arc::make_mut(&mut next.halls).remove(hall_id);
        Arc::make_mut(&mut next.order).retain(|id| id != hall_id);
        next.checked()
    }

    /// Empty layout
    pub fn reset(&self) -> Self {
        Self::default()
    }

    fn replace_hall(&self, node: HallNode) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.halls).insert(node.id.clone(), Arc::new(node));
        next.checked()
    }

    fn replace_stall(&self, stall: Stall) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.stalls).insert(stall.id.clone(), Arc::new(stall));
        next.checked()
    }

    fn insert_stalls(&self, node: &HallNode, batch: Vec<Stall>) -> Self {
        let mut node = node.clone();
        let mut next = self.clone();
        let stalls = Arc::make_mut(&mut next.stalls);
        for stall in batch {
            node.stalls.push(stall.id.clone());
            stalls.insert(stall.id.clone(), Arc::new(stall));
        }
        Arc::make_mut(&mut next.halls).insert(node.id.clone(), Arc::new(node));
        next.checked()
    }
}

impl Serialize for LayoutModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_layout().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LayoutModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let layout = MapLayout::deserialize(deserializer)?;
        LayoutModel::from_layout(&layout).map_err(de::Error::custom)
    }
}
