//! View renderer - turns a matched layout into styled sprites
//!
//! Stateless: the same input always yields the same scene. Hover and
//! selection only affect styling; nothing here touches the layout or the
//! records.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::geometry::Point;
use crate::matcher::{MatchedLayout, MatchedStall};
use crate::models::{HallId, RecordId, StallId, StallRecord, StallSize};

const RESERVED_FILL: &str = "rgba(100, 100, 100, 0.7)";
const SELECTED_FILL: &str = "rgba(37, 99, 235, 0.6)";
const HOVERED_FILL: &str = "rgba(34, 197, 94, 0.6)";
const NEUTRAL_FILL: &str = "rgba(158, 158, 158, 0.8)";
const VIRTUAL_FILL: &str = "rgba(224, 224, 224, 0.4)";

const BASE_STROKE: &str = "#333";
const SELECTED_STROKE: &str = "#0070f3";
const HOVERED_STROKE: &str = "#4caf50";
const VIRTUAL_STROKE: &str = "#999";

const CORNER_RADIUS: f64 = 4.0;
const FILL_ALPHA: f64 = 0.8;

/// Visual attributes of one stall rectangle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StallStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub shadow_blur: f64,
    pub shadow_opacity: f64,
    pub opacity: f64,
    pub corner_radius: f64,
}

impl StallStyle {
    fn plain(fill: String) -> Self {
        Self {
            fill,
            stroke: BASE_STROKE.to_string(),
            stroke_width: 1.0,
            shadow_blur: 0.0,
            shadow_opacity: 0.0,
            opacity: 1.0,
            corner_radius: CORNER_RADIUS,
        }
    }

    fn reserved() -> Self {
        Self {
            opacity: 0.5,
            ..Self::plain(RESERVED_FILL.to_string())
        }
    }

    fn selected() -> Self {
        Self {
            stroke: SELECTED_STROKE.to_string(),
            stroke_width: 3.0,
            shadow_blur: 15.0,
            shadow_opacity: 0.5,
            ..Self::plain(SELECTED_FILL.to_string())
        }
    }

    fn hovered() -> Self {
        Self {
            stroke: HOVERED_STROKE.to_string(),
            stroke_width: 2.0,
            shadow_blur: 10.0,
            shadow_opacity: 0.3,
            ..Self::plain(HOVERED_FILL.to_string())
        }
    }

    fn placeholder() -> Self {
        Self {
            stroke: VIRTUAL_STROKE.to_string(),
            opacity: 0.5,
            corner_radius: 0.0,
            ..Self::plain(VIRTUAL_FILL.to_string())
        }
    }
}

/// `#rrggbb` or `#rgb` to an rgba() string at the given alpha
fn hex_to_rgba(hex: &str, alpha: f64) -> Option<String> {
    let digits = hex.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    Some(format!("rgba({}, {}, {}, {})", r, g, b, alpha))
}

fn palette_fill(size: StallSize) -> String {
    size.default_color()
        .and_then(|hex| hex_to_rgba(hex, FILL_ALPHA))
        .unwrap_or_else(|| NEUTRAL_FILL.to_string())
}

/// Which stall sizes the visitor wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SizeFilter {
    #[default]
    All,
    Only(StallSize),
}

impl SizeFilter {
    pub fn admits(self, size: StallSize) -> bool {
        match self {
            SizeFilter::All => true,
            SizeFilter::Only(wanted) => wanted == size,
        }
    }
}

/// Hall name drawn at its label anchor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HallLabel {
    pub hall_id: HallId,
    pub text: String,
    pub position: Point,
}

/// One drawable stall
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StallSprite {
    pub stall_id: StallId,
    pub record_id: Option<RecordId>,
    pub label: String,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub style: StallStyle,
    pub is_virtual: bool,
}

/// Everything the view canvas draws
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ViewScene {
    /// No layout, or a layout without stalls
    NotConfigured,
    Map {
        halls: Vec<HallLabel>,
        stalls: Vec<StallSprite>,
    },
}

impl ViewScene {
    pub fn is_configured(&self) -> bool {
        matches!(self, ViewScene::Map { .. })
    }

    pub fn sprites(&self) -> &[StallSprite] {
        match self {
            ViewScene::NotConfigured => &[],
            ViewScene::Map { stalls, .. } => stalls,
        }
    }
}

/// Render input
#[derive(Debug, Clone, Copy)]
pub struct ViewInput<'a> {
    pub layout: Option<&'a MatchedLayout>,
    pub selection: &'a HashSet<RecordId>,
    pub hovered: Option<&'a RecordId>,
    pub size_filter: SizeFilter,
}

/// What a click on the view canvas amounts to
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Hand the record to the reservation handler
    Forward(StallRecord),
    /// Virtual stall; tell the visitor it cannot be reserved
    NotAvailable(String),
    /// Empty canvas
    Inert,
}

pub struct ViewRenderer;

impl ViewRenderer {
    pub fn render(input: &ViewInput<'_>) -> ViewScene {
        let Some(layout) = input.layout.filter(|l| l.has_stalls()) else {
            return ViewScene::NotConfigured;
        };

        let halls = layout
            .halls
            .iter()
            .map(|h| HallLabel {
                hall_id: h.id.clone(),
                text: h.name.clone(),
                position: h.label,
            })
            .collect();

        let stalls = layout
            .stalls()
            .filter(|s| input.size_filter.admits(s.effective_size()))
            .map(|s| Self::sprite(s, input))
            .collect();

        ViewScene::Map { halls, stalls }
    }

    /// Resolve styling for one stall: reserved, selected, hovered, then
    /// authored colour, then size palette
    pub fn style(stall: &MatchedStall, input: &ViewInput<'_>) -> StallStyle {
        let Some(record) = stall.record() else {
            return StallStyle::placeholder();
        };

        if record.reserved {
            return StallStyle::reserved();
        }
        if input.selection.contains(&record.id) {
            return StallStyle::selected();
        }
        if input.hovered == Some(&record.id) {
            return StallStyle::hovered();
        }

        let fill = hex_to_rgba(&stall.stall.color, FILL_ALPHA)
            .unwrap_or_else(|| palette_fill(stall.effective_size()));
        StallStyle::plain(fill)
    }

    fn sprite(stall: &MatchedStall, input: &ViewInput<'_>) -> StallSprite {
        StallSprite {
            stall_id: stall.stall.id.clone(),
            record_id: stall.record().map(|r| r.id.clone()),
            label: stall.display_id().to_string(),
            position: stall.stall.position(),
            width: stall.stall.width,
            height: stall.stall.height,
            style: Self::style(stall, input),
            is_virtual: stall.is_virtual(),
        }
    }

    /// Dispatch a click on whatever was hit
    pub fn click(hit: Option<&MatchedStall>) -> ClickOutcome {
        match hit {
            None => ClickOutcome::Inert,
            Some(stall) => match stall.record() {
                Some(record) => ClickOutcome::Forward(record.clone()),
                None => {
                    warn!(stall = %stall.display_id(), "Stall has no reservation record");
                    ClickOutcome::NotAvailable(stall.display_id().to_string())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::StallMatcher;
    use crate::models::{Hall, MapLayout, Stall};

    fn merged(records: &[StallRecord]) -> MatchedLayout {
        let mut hall = Hall::new("Hall A").with_id(HallId::from("h1"));
        for (i, (code, size)) in [("A01", StallSize::Small), ("A02", StallSize::Large), ("A03", StallSize::Medium)]
            .into_iter()
            .enumerate()
        {
            hall.stalls.push(Stall::new(
                hall.id.clone(),
                code.into(),
                Point::new(i as f64 * 100.0, 0.0),
                size,
            ));
        }
        StallMatcher::new(false).match_layout(&MapLayout::new(vec![hall]), records)
    }

    fn input<'a>(layout: Option<&'a MatchedLayout>, selection: &'a HashSet<RecordId>) -> ViewInput<'a> {
        ViewInput {
            layout,
            selection,
            hovered: None,
            size_filter: SizeFilter::All,
        }
    }

    #[test]
    fn test_empty_layout_is_not_configured() {
        let selection = HashSet::new();
        assert_eq!(ViewRenderer::render(&input(None, &selection)), ViewScene::NotConfigured);

        let empty = StallMatcher::default().match_layout(&MapLayout::default(), &[]);
        let scene = ViewRenderer::render(&input(Some(&empty), &selection));
        assert!(!scene.is_configured());
        assert!(scene.sprites().is_empty());
    }

    #[test]
    fn test_style_priority() {
        let records = vec![
            StallRecord::new("1", "A01", StallSize::Small).reserved(),
            StallRecord::new("2", "A02", StallSize::Large),
            StallRecord::new("3", "A03", StallSize::Medium),
        ];
        let layout = merged(&records);
        let selection: HashSet<RecordId> = ["1", "2"].into_iter().map(RecordId::from).collect();
        let hovered = RecordId::from("3");
        let view = ViewInput {
            hovered: Some(&hovered),
            ..input(Some(&layout), &selection)
        };

        let sprites = ViewRenderer::render(&view).sprites().to_vec();
        // reserved wins over selected
        assert_eq!(sprites[0].style.fill, RESERVED_FILL);
        assert_eq!(sprites[0].style.opacity, 0.5);

        assert_eq!(sprites[1].style.fill, SELECTED_FILL);
        assert_eq!(sprites[1].style.stroke, "#0070f3");
        assert_eq!(sprites[1].style.stroke_width, 3.0);
        assert_eq!(sprites[1].style.shadow_blur, 15.0);

        assert_eq!(sprites[2].style.fill, HOVERED_FILL);
        assert_eq!(sprites[2].style.stroke_width, 2.0);
        assert_eq!(sprites[2].style.shadow_blur, 10.0);
    }

    #[test]
    fn test_default_fill_uses_authored_colour() {
        let records = vec![StallRecord::new("2", "A02", StallSize::Large)];
        let mut layout = merged(&records);
        let selection = HashSet::new();

        let style = ViewRenderer::style(&layout.halls[0].stalls[1], &input(Some(&layout), &selection));
        assert_eq!(style.fill, "rgba(76, 175, 80, 0.8)");

        layout.halls[0].stalls[1].stall.color = "not-a-colour".into();
        let style = ViewRenderer::style(&layout.halls[0].stalls[1], &input(Some(&layout), &selection));
        assert_eq!(style.fill, "rgba(76, 175, 80, 0.8)");

        layout.halls[0].stalls[1].stall.color = "#fff".into();
        let style = ViewRenderer::style(&layout.halls[0].stalls[1], &input(Some(&layout), &selection));
        assert_eq!(style.fill, "rgba(255, 255, 255, 0.8)");
    }

    #[test]
    fn test_unknown_size_is_neutral() {
        assert_eq!(palette_fill(StallSize::Unknown), NEUTRAL_FILL);
        assert_eq!(palette_fill(StallSize::Small), "rgba(255, 235, 59, 0.8)");
    }

    #[test]
    fn test_virtual_stalls_never_highlight() {
        let layout = merged(&[]);
        let selection = HashSet::new();
        let sprites = ViewRenderer::render(&input(Some(&layout), &selection))
            .sprites()
            .to_vec();
        assert_eq!(sprites.len(), 3);
        assert!(sprites.iter().all(|s| s.is_virtual));
        assert!(sprites.iter().all(|s| s.style.fill == VIRTUAL_FILL));
        assert_eq!(sprites[0].style.stroke, "#999");
    }

    #[test]
    fn test_size_filter() {
        let records = vec![StallRecord::new("1", "A01", StallSize::Large)];
        let layout = merged(&records);
        let selection = HashSet::new();
        let view = ViewInput {
            size_filter: SizeFilter::Only(StallSize::Large),
            ..input(Some(&layout), &selection)
        };
        let labels: Vec<String> = ViewRenderer::render(&view)
            .sprites()
            .iter()
            .map(|s| s.label.clone())
            .collect();
        // A01 is large through its record, A02 is authored large
        assert_eq!(labels, vec!["A01", "A02"]);
    }

    #[test]
    fn test_click_outcomes() {
        let records = vec![StallRecord::new("1", "A01", StallSize::Small)];
        let layout = merged(&records);
        let hall = &layout.halls[0];

        assert!(matches!(
            ViewRenderer::click(Some(&hall.stalls[0])),
            ClickOutcome::Forward(r) if r.name == "A01"
        ));
        assert_eq!(
            ViewRenderer::click(Some(&hall.stalls[1])),
            ClickOutcome::NotAvailable("A02".into())
        );
        assert_eq!(ViewRenderer::click(None), ClickOutcome::Inert);
    }
}
