//! Map designer interaction controller
//!
//! `DesignController::handle` is a pure reducer: it takes the current
//! [`DesignState`] and one input event and returns the next state plus the
//! effects the UI should act on. The layout inside the state is only ever
//! replaced by a new snapshot, never edited in place.

use serde::{Deserialize, Serialize};
use stallmap_core::grid::GridLines;
use stallmap_core::{
    grid_lines, Error, GridSnapper, GridSpec, HallId, LayoutModel, MapConfig, MapLayout, Point,
    PanGesture, PointerButton, Result, Stall, StallId, StallPatch, StallSize, Viewport,
    ViewportMode,
};
use tracing::{debug, warn};

/// Active canvas tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolMode {
    #[default]
    Select,
    Draw,
    Delete,
}

/// Keys the designer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Escape,
    Char(char),
}

/// What a press landed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PressTarget {
    Stall(StallId),
    HallLabel(HallId),
    Canvas,
}

/// A pressed primary button, until release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Press {
    pub target: PressTarget,
    /// World point under the pointer at press time
    pub start: Point,
    /// Latest world point under the pointer
    pub current: Point,
    /// Position of the pressed item at press time
    pub origin: Point,
}

impl Press {
    pub fn moved(&self) -> bool {
        self.current != self.start
    }

    /// Unsnapped position the pressed item would take if released now
    pub fn preview(&self) -> Point {
        self.origin + (self.current - self.start)
    }
}

/// Everything the designer canvas needs to redraw and react
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignState {
    pub tool: ToolMode,
    pub selected: Option<StallId>,
    pub active_hall: Option<HallId>,
    pub press: Option<Press>,
    pub pan: PanGesture,
    pub grid_visible: bool,
    pub snapper: GridSnapper,
    /// Size used for newly drawn stalls
    pub draw_size: StallSize,
    pub viewport: Viewport,
    pub layout: LayoutModel,
}

impl DesignState {
    /// Hall that receives drawn stalls: the active hall if it still exists,
    /// otherwise the first hall
    pub fn target_hall(&self) -> Option<HallId> {
        self.active_hall
            .as_ref()
            .and_then(|id| self.layout.hall(id))
            .or_else(|| self.layout.first_hall())
            .map(|h| h.id.clone())
    }

    pub fn selected_stall(&self) -> Option<&Stall> {
        self.selected.as_ref().and_then(|id| self.layout.stall(id))
    }

    /// Layout ready to persist; a map without stalls is refused
    pub fn prepare_save(&self) -> Result<MapLayout> {
        if !self.layout.has_stalls() {
            return Err(Error::EmptyLayout);
        }
        Ok(self.layout.to_layout())
    }

    /// Grid lines covering the visible canvas, in world units
    pub fn visible_grid(&self) -> Option<GridLines> {
        if !self.grid_visible {
            return None;
        }
        let canvas = self.viewport.canvas();
        let far = self.viewport.to_world(Point::new(canvas.width, canvas.height));
        Some(grid_lines(far.x.max(0.0), far.y.max(0.0), self.snapper.pitch))
    }
}

/// Designer inputs
#[derive(Debug, Clone, PartialEq)]
pub enum DesignEvent {
    PointerDown {
        screen: Point,
        button: PointerButton,
        modifier: bool,
    },
    PointerMove {
        screen: Point,
    },
    PointerUp {
        screen: Point,
    },
    Wheel {
        screen: Point,
        delta: f64,
    },
    Key(Key),
    SetTool(ToolMode),
    SetActiveHall(Option<HallId>),
    SetSnap(bool),
    SetDrawSize(StallSize),
    AddHall(String),
    RenameHall {
        hall_id: HallId,
        name: String,
    },
    DeleteHall(HallId),
    /// Sidebar grid insert; the hall is looked up by name
    AddGrid {
        hall_name: String,
        spec: GridSpec,
    },
    /// Edit modal saved
    ApplyEdit {
        stall_id: StallId,
        patch: StallPatch,
    },
    /// Edit modal deleted the stall
    DeleteFromModal(StallId),
    ZoomIn,
    ZoomOut,
    ResetView,
    FitToContent,
    ResetMap,
}

/// Things the UI must do after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The layout snapshot was replaced
    ModelChanged,
    /// Open the edit modal for this stall
    StallSelected(Stall),
    SelectionCleared,
    GridToggled(bool),
    Warning(String),
    /// A layout operation was refused; the state is unchanged
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: DesignState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(state: DesignState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Pure reducer for the designer canvas
#[derive(Debug, Clone, Default)]
pub struct DesignController {
    config: MapConfig,
}

impl DesignController {
    pub fn new(config: MapConfig) -> Self {
        Self { config }
    }

    /// Fresh state around an existing layout
    pub fn initial_state(&self, layout: LayoutModel) -> DesignState {
        DesignState {
            tool: ToolMode::Select,
            selected: None,
            active_hall: layout.first_hall().map(|h| h.id.clone()),
            press: None,
            pan: PanGesture::default(),
            grid_visible: self.config.grid_visible,
            snapper: self.config.snapper(),
            draw_size: StallSize::Small,
            viewport: self.config.viewport(ViewportMode::Design),
            layout,
        }
    }

    pub fn handle(&self, state: &DesignState, event: DesignEvent) -> Transition {
        let mut next = state.clone();

        match event {
            DesignEvent::PointerDown {
                screen,
                button,
                modifier,
            } => {
                if PanGesture::should_start(button, modifier, state.tool == ToolMode::Select) {
                    next.pan.begin(screen);
                    next.press = None;
                } else if button == PointerButton::Primary {
                    next.press = Some(press_at(state, state.viewport.to_world(screen)));
                }
                Transition::new(next)
            }
            DesignEvent::PointerMove { screen } => {
                if !next.pan.update(screen, &mut next.viewport) {
                    let world = next.viewport.to_world(screen);
                    if let Some(press) = next.press.as_mut() {
                        press.current = world;
                    }
                }
                Transition::new(next)
            }
            DesignEvent::PointerUp { screen } => {
                if next.pan.end() {
                    return Transition::new(next);
                }
                let Some(mut press) = next.press.take() else {
                    return Transition::new(next);
                };
                press.current = next.viewport.to_world(screen);
                self.release(next, press)
            }
            DesignEvent::Wheel { screen, delta } => {
                next.viewport.zoom(screen, delta);
                Transition::new(next)
            }
            DesignEvent::Key(key) => self.key(next, key),
            DesignEvent::SetTool(tool) => {
                next.tool = tool;
                next.press = None;
                Transition::new(next)
            }
            DesignEvent::SetActiveHall(hall_id) => match hall_id {
                Some(id) if state.layout.hall(&id).is_none() => {
                    failed(state, Error::HallNotFound(id))
                }
                hall_id => {
                    next.active_hall = hall_id;
                    Transition::new(next)
                }
            },
            DesignEvent::SetSnap(enabled) => {
                next.snapper.enabled = enabled;
                Transition::new(next)
            }
            DesignEvent::SetDrawSize(size) => {
                next.draw_size = size;
                Transition::new(next)
            }
            DesignEvent::AddHall(name) => match state.layout.add_hall(&name) {
                Ok((layout, hall_id)) => {
                    next.layout = layout;
                    next.active_hall = Some(hall_id);
                    Transition::new(next).with(Effect::ModelChanged)
                }
                Err(e) => failed(state, e),
            },
            DesignEvent::RenameHall { hall_id, name } => {
                match state.layout.rename_hall(&hall_id, &name) {
                    Ok(layout) => {
                        next.layout = layout;
                        Transition::new(next).with(Effect::ModelChanged)
                    }
                    Err(e) => failed(state, e),
                }
            }
            DesignEvent::DeleteHall(hall_id) => {
                if state.layout.hall(&hall_id).is_none() {
                    return Transition::new(next);
                }
                next.layout = state.layout.delete_hall(&hall_id);
                if next.active_hall.as_ref() == Some(&hall_id) {
                    next.active_hall = next.layout.first_hall().map(|h| h.id.clone());
                }
                let mut transition = Transition::new(next).with(Effect::ModelChanged);
                if transition
                    .state
                    .selected
                    .as_ref()
                    .is_some_and(|id| transition.state.layout.stall(id).is_none())
                {
                    transition.state.selected = None;
                    transition.effects.push(Effect::SelectionCleared);
                }
                transition
            }
            DesignEvent::AddGrid { hall_name, spec } => {
                let Some(hall) = state.layout.find_hall_by_name(&hall_name) else {
                    return failed(
                        state,
                        Error::InvalidOperation(format!(
                            "Hall '{}' not found, create the hall first",
                            hall_name.trim()
                        )),
                    );
                };
                match state.layout.add_stall_grid(&hall.id, &spec) {
                    Ok((layout, ids)) => {
                        debug!(hall = %hall.name, count = ids.len(), "Added stall grid");
                        next.layout = layout;
                        Transition::new(next).with(Effect::ModelChanged)
                    }
                    Err(e) => failed(state, e),
                }
            }
            DesignEvent::ApplyEdit { stall_id, patch } => {
                match state.layout.update_stall(&stall_id, &patch) {
                    Ok(layout) => {
                        next.layout = layout;
                        Transition::new(next).with(Effect::ModelChanged)
                    }
                    Err(e) => failed(state, e),
                }
            }
            DesignEvent::DeleteFromModal(stall_id) => delete_stall(next, &stall_id),
            DesignEvent::ZoomIn => {
                next.viewport.zoom_in();
                Transition::new(next)
            }
            DesignEvent::ZoomOut => {
                next.viewport.zoom_out();
                Transition::new(next)
            }
            DesignEvent::ResetView => {
                next.viewport.reset();
                Transition::new(next)
            }
            DesignEvent::FitToContent => {
                if let Some(bounds) = next.layout.bounds() {
                    next.viewport.fit_to_content(bounds);
                }
                Transition::new(next)
            }
            DesignEvent::ResetMap => {
                next.layout = state.layout.reset();
                next.active_hall = None;
                next.press = None;
                let had_selection = next.selected.take().is_some();
                let transition = Transition::new(next).with(Effect::ModelChanged);
                if had_selection {
                    transition.with(Effect::SelectionCleared)
                } else {
                    transition
                }
            }
        }
    }

    fn release(&self, mut next: DesignState, press: Press) -> Transition {
        let moved = press.moved();

        match (next.tool, &press.target) {
            (ToolMode::Select, PressTarget::Stall(id)) if moved => {
                let position = next.snapper.apply(press.preview());
                match next.layout.move_stall(id, position) {
                    Ok(layout) => {
                        next.layout = layout;
                        Transition::new(next).with(Effect::ModelChanged)
                    }
                    Err(e) => failed(&next, e),
                }
            }
            (ToolMode::Select, PressTarget::Stall(id)) => match next.layout.stall(id).cloned() {
                Some(stall) => {
                    next.selected = Some(stall.id.clone());
                    Transition::new(next).with(Effect::StallSelected(stall))
                }
                None => Transition::new(next),
            },
            (ToolMode::Select, PressTarget::HallLabel(id)) if moved => {
                let position = next.snapper.apply(press.preview());
                match next.layout.move_hall_label(id, position) {
                    Ok(layout) => {
                        next.layout = layout;
                        Transition::new(next).with(Effect::ModelChanged)
                    }
                    Err(e) => failed(&next, e),
                }
            }
            (ToolMode::Select, PressTarget::HallLabel(id)) => {
                next.active_hall = Some(id.clone());
                Transition::new(next)
            }
            (ToolMode::Select, PressTarget::Canvas) if !moved => {
                next.selected = None;
                Transition::new(next).with(Effect::SelectionCleared)
            }
            (ToolMode::Draw, PressTarget::Canvas) if !moved => self.draw(next, press.current),
            (ToolMode::Delete, PressTarget::Stall(id)) if !moved => {
                let id = id.clone();
                delete_stall(next, &id)
            }
            _ => Transition::new(next),
        }
    }

    fn draw(&self, mut next: DesignState, world: Point) -> Transition {
        let Some(hall_id) = next.target_hall() else {
            warn!("Cannot draw a stall before any hall exists");
            return Transition::new(next).with(Effect::Warning(
                "Add a hall before drawing stalls".to_string(),
            ));
        };

        let position = next.snapper.apply(world).clamp_non_negative();
        match next
            .layout
            .add_stall(&hall_id, position, next.draw_size, Default::default())
        {
            Ok((layout, stall_id)) => {
                debug!(stall = %stall_id, hall = %hall_id, "Drew stall");
                next.layout = layout;
                Transition::new(next).with(Effect::ModelChanged)
            }
            Err(e) => failed(&next, e),
        }
    }

    fn key(&self, mut next: DesignState, key: Key) -> Transition {
        match key {
            Key::Delete => match next.selected.clone() {
                Some(id) => delete_stall(next, &id),
                None => Transition::new(next),
            },
            Key::Escape => {
                next.press = None;
                if next.selected.take().is_some() {
                    Transition::new(next).with(Effect::SelectionCleared)
                } else {
                    Transition::new(next)
                }
            }
            Key::Char(c) if c.eq_ignore_ascii_case(&'g') => {
                next.grid_visible = !next.grid_visible;
                let visible = next.grid_visible;
                Transition::new(next).with(Effect::GridToggled(visible))
            }
            Key::Char(_) => Transition::new(next),
        }
    }
}

fn press_at(state: &DesignState, world: Point) -> Press {
    let (target, origin) = if let Some(stall) = state.layout.hit_test(world) {
        (PressTarget::Stall(stall.id.clone()), stall.position())
    } else if let Some(hall) = state.layout.hit_test_label(world) {
        (PressTarget::HallLabel(hall.id.clone()), hall.label)
    } else {
        (PressTarget::Canvas, world)
    };
    Press {
        target,
        start: world,
        current: world,
        origin,
    }
}

fn delete_stall(mut next: DesignState, stall_id: &StallId) -> Transition {
    if next.layout.stall(stall_id).is_none() {
        return Transition::new(next);
    }
    next.layout = next.layout.delete_stall(stall_id);
    let cleared = next.selected.as_ref() == Some(stall_id);
    if cleared {
        next.selected = None;
    }
    let transition = Transition::new(next).with(Effect::ModelChanged);
    if cleared {
        transition.with(Effect::SelectionCleared)
    } else {
        transition
    }
}

fn failed(state: &DesignState, error: Error) -> Transition {
    debug!(error = %error, "Design operation refused");
    Transition::new(state.clone()).with(Effect::Failed(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stallmap_core::StallOverrides;

    fn controller(pitch: f64) -> DesignController {
        DesignController::new(MapConfig {
            grid_pitch: pitch,
            ..MapConfig::default()
        })
    }

    fn state_with_stall(controller: &DesignController, at: Point) -> (DesignState, StallId) {
        let (layout, hall) = LayoutModel::new().add_hall("Hall A").unwrap();
        let (layout, stall) = layout
            .add_stall(&hall, at, StallSize::Small, StallOverrides::default())
            .unwrap();
        (controller.initial_state(layout), stall)
    }

    fn run(controller: &DesignController, state: DesignState, events: Vec<DesignEvent>) -> Transition {
        let mut transition = Transition::new(state);
        for event in events {
            let next = controller.handle(&transition.state, event);
            transition.state = next.state;
            transition.effects.extend(next.effects);
        }
        transition
    }

    fn down(x: f64, y: f64) -> DesignEvent {
        DesignEvent::PointerDown {
            screen: Point::new(x, y),
            button: PointerButton::Primary,
            modifier: false,
        }
    }

    fn up(x: f64, y: f64) -> DesignEvent {
        DesignEvent::PointerUp {
            screen: Point::new(x, y),
        }
    }

    fn moved(x: f64, y: f64) -> DesignEvent {
        DesignEvent::PointerMove {
            screen: Point::new(x, y),
        }
    }

    #[test]
    fn test_drag_commits_snapped_position() {
        let controller = controller(10.0);
        let (state, stall) = state_with_stall(&controller, Point::new(53.0, 77.0));

        let t = run(
            &controller,
            state,
            vec![down(53.0, 77.0), moved(90.0, 100.0), up(118.0, 124.0)],
        );
        assert_eq!(
            t.state.layout.stall(&stall).unwrap().position(),
            Point::new(120.0, 120.0)
        );
        assert_eq!(t.effects, vec![Effect::ModelChanged]);
        assert!(t.state.press.is_none());
    }

    #[test]
    fn test_drag_without_snap() {
        let controller = controller(10.0);
        let (state, stall) = state_with_stall(&controller, Point::new(53.0, 77.0));
        let t = run(
            &controller,
            state,
            vec![DesignEvent::SetSnap(false), down(60.0, 80.0), up(118.0, 124.0)],
        );
        assert_eq!(
            t.state.layout.stall(&stall).unwrap().position(),
            Point::new(111.0, 121.0)
        );
    }

    #[test]
    fn test_click_selects_and_empty_click_clears() {
        let controller = controller(20.0);
        let (state, stall) = state_with_stall(&controller, Point::new(100.0, 100.0));
        let before = state.layout.clone();

        let t = run(&controller, state, vec![down(110.0, 110.0), up(110.0, 110.0)]);
        assert_eq!(t.state.selected, Some(stall.clone()));
        assert!(matches!(&t.effects[..], [Effect::StallSelected(s)] if s.id == stall));
        assert_eq!(t.state.layout, before);

        let t = run(&controller, t.state, vec![down(600.0, 600.0), up(600.0, 600.0)]);
        assert_eq!(t.state.selected, None);
        assert_eq!(t.effects, vec![Effect::SelectionCleared]);
    }

    #[test]
    fn test_draw_on_active_hall() {
        let controller = controller(20.0);
        let (layout, hall_a) = LayoutModel::new().add_hall("Hall A").unwrap();
        let (layout, hall_b) = layout.add_hall("Hall B").unwrap();
        let state = controller.initial_state(layout);
        assert_eq!(state.target_hall(), Some(hall_a.clone()));

        let t = run(
            &controller,
            state,
            vec![
                DesignEvent::SetActiveHall(Some(hall_b.clone())),
                DesignEvent::SetTool(ToolMode::Draw),
                down(213.0, 95.0),
                up(213.0, 95.0),
            ],
        );
        let stalls: Vec<&Stall> = t.state.layout.stalls_in(&hall_b).collect();
        assert_eq!(stalls.len(), 1);
        assert_eq!(stalls[0].position(), Point::new(220.0, 100.0));
        assert_eq!(stalls[0].code, "B01");
        assert_eq!(t.effects, vec![Effect::ModelChanged]);
    }

    #[test]
    fn test_draw_without_hall_warns() {
        let controller = DesignController::default();
        let state = controller.initial_state(LayoutModel::new());
        let t = run(
            &controller,
            state.clone(),
            vec![DesignEvent::SetTool(ToolMode::Draw), down(10.0, 10.0), up(10.0, 10.0)],
        );
        assert!(matches!(&t.effects[..], [Effect::Warning(_)]));
        assert_eq!(t.state.layout, state.layout);
    }

    #[test]
    fn test_delete_tool_and_keys() {
        let controller = controller(20.0);
        let (state, stall) = state_with_stall(&controller, Point::new(100.0, 100.0));

        let t = run(
            &controller,
            state.clone(),
            vec![DesignEvent::SetTool(ToolMode::Delete), down(110.0, 110.0), up(110.0, 110.0)],
        );
        assert!(t.state.layout.stall(&stall).is_none());

        let t = run(
            &controller,
            state,
            vec![down(110.0, 110.0), up(110.0, 110.0), DesignEvent::Key(Key::Delete)],
        );
        assert!(t.state.layout.stall(&stall).is_none());
        assert_eq!(t.state.selected, None);
        assert!(t.effects.contains(&Effect::SelectionCleared));

        let t = run(
            &controller,
            t.state,
            vec![DesignEvent::Key(Key::Char('G')), DesignEvent::Key(Key::Char('g'))],
        );
        assert_eq!(
            t.effects,
            vec![Effect::GridToggled(false), Effect::GridToggled(true)]
        );
    }

    #[test]
    fn test_escape_clears_selection() {
        let controller = controller(20.0);
        let (state, _) = state_with_stall(&controller, Point::new(100.0, 100.0));
        let t = run(
            &controller,
            state,
            vec![down(110.0, 110.0), up(110.0, 110.0), DesignEvent::Key(Key::Escape)],
        );
        assert_eq!(t.state.selected, None);
        assert_eq!(t.effects.last(), Some(&Effect::SelectionCleared));
    }

    #[test]
    fn test_pan_release_is_not_a_click() {
        let controller = controller(20.0);
        let (state, _) = state_with_stall(&controller, Point::new(100.0, 100.0));
        let t = run(
            &controller,
            state,
            vec![
                DesignEvent::PointerDown {
                    screen: Point::new(110.0, 110.0),
                    button: PointerButton::Middle,
                    modifier: false,
                },
                moved(150.0, 130.0),
                up(150.0, 130.0),
            ],
        );
        assert!(t.effects.is_empty());
        assert_eq!(t.state.viewport.offset(), Point::new(40.0, 20.0));
        assert_eq!(t.state.selected, None);
    }

    #[test]
    fn test_label_drag() {
        let controller = controller(10.0);
        let (layout, hall) = LayoutModel::new().add_hall("Hall A").unwrap();
        let state = controller.initial_state(layout);
        let t = run(
            &controller,
            state,
            vec![down(25.0, 25.0), up(102.0, 58.0)],
        );
        assert_eq!(t.state.layout.hall(&hall).unwrap().label, Point::new(100.0, 50.0));
    }

    #[test]
    fn test_sidebar_operations() {
        let controller = controller(20.0);
        let state = controller.initial_state(LayoutModel::new());

        let t = run(
            &controller,
            state,
            vec![
                DesignEvent::AddHall("Hall A".into()),
                DesignEvent::AddHall("Hall A".into()),
                DesignEvent::AddGrid {
                    hall_name: "Hall Z".into(),
                    spec: GridSpec::default(),
                },
                DesignEvent::AddGrid {
                    hall_name: "Hall A".into(),
                    spec: GridSpec::default(),
                },
            ],
        );
        assert_eq!(t.state.layout.stall_count(), 24);
        assert!(matches!(
            &t.effects[..],
            [Effect::ModelChanged, Effect::Failed(_), Effect::Failed(_), Effect::ModelChanged]
        ));
        assert!(t.state.prepare_save().is_ok());
    }

    #[test]
    fn test_edit_modal_results() {
        let controller = controller(20.0);
        let (state, stall) = state_with_stall(&controller, Point::new(100.0, 100.0));

        let patch = StallPatch {
            code: Some("VIP1".into()),
            size: Some(StallSize::Large),
            ..Default::default()
        };
        let t = controller.handle(
            &state,
            DesignEvent::ApplyEdit {
                stall_id: stall.clone(),
                patch,
            },
        );
        let edited = t.state.layout.stall(&stall).unwrap();
        assert_eq!(edited.code, "VIP1");
        assert_eq!(edited.color, "#4caf50");

        let bad = StallPatch {
            code: Some(String::new()),
            ..Default::default()
        };
        let refused = controller.handle(
            &t.state,
            DesignEvent::ApplyEdit {
                stall_id: stall.clone(),
                patch: bad,
            },
        );
        assert_eq!(refused.state, t.state);
        assert!(matches!(&refused.effects[..], [Effect::Failed(_)]));

        let t = controller.handle(&t.state, DesignEvent::DeleteFromModal(stall.clone()));
        assert!(t.state.layout.stall(&stall).is_none());
    }

    #[test]
    fn test_prepare_save_refuses_empty_map() {
        let controller = DesignController::default();
        let t = controller.handle(
            &controller.initial_state(LayoutModel::new()),
            DesignEvent::AddHall("Hall A".into()),
        );
        assert!(matches!(t.state.prepare_save(), Err(Error::EmptyLayout)));
    }

    #[test]
    fn test_reset_map_and_view() {
        let controller = controller(20.0);
        let (state, _) = state_with_stall(&controller, Point::new(100.0, 100.0));
        let t = run(
            &controller,
            state,
            vec![
                DesignEvent::Wheel {
                    screen: Point::new(300.0, 300.0),
                    delta: -1.0,
                },
                DesignEvent::ResetView,
                DesignEvent::ResetMap,
            ],
        );
        assert_eq!(t.state.viewport.scale(), 1.0);
        assert!(t.state.layout.is_empty());
        assert_eq!(t.state.target_hall(), None);
    }

    #[test]
    fn test_state_serializes() {
        let controller = controller(20.0);
        let (state, _) = state_with_stall(&controller, Point::new(100.0, 100.0));
        let json = serde_json::to_string(&state).unwrap();
        let back: DesignState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_visible_grid() {
        let controller = controller(20.0);
        let state = controller.initial_state(LayoutModel::new());
        assert_eq!(state.visible_grid().unwrap().count(), 61 + 41);

        let t = controller.handle(&state, DesignEvent::Key(Key::Char('g')));
        assert!(t.state.visible_grid().is_none());
    }
}
