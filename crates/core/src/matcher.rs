//! Stall matcher - binds design stalls to authoritative stall records
//!
//! Resolution runs through fixed tiers, first hit wins:
//! 1. exact equality of the stall's display code with a record id or name
//! 2. trimmed, case-insensitive equality
//! 3. equality after uppercasing and stripping leading zeros (`A1` == `A01`)
//! 4. positional fallback: the record at the stall's index within its hall
//!
//! Stalls that resolve nowhere become virtual. Within a tier the first record
//! in list order wins, so a fixed input always produces the same result.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::geometry::Point;
use crate::layout::LayoutModel;
use crate::models::{HallId, MapLayout, RecordId, Stall, StallRecord, StallSize};

/// Which tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    LeadingZero,
    Positional,
}

/// Outcome for one design stall
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Resolution {
    Matched { record: StallRecord, tier: MatchTier },
    /// No record found; rendered greyed and not reservable
    Virtual { display_id: String },
}

/// A design stall together with its resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedStall {
    pub stall: Stall,
    pub resolution: Resolution,
    /// Index of the stall within its hall
    pub ordinal: usize,
}

impl MatchedStall {
    pub fn record(&self) -> Option<&StallRecord> {
        match &self.resolution {
            Resolution::Matched { record, .. } => Some(record),
            Resolution::Virtual { .. } => None,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.resolution, Resolution::Virtual { .. })
    }

    pub fn is_reserved(&self) -> bool {
        self.record().is_some_and(|r| r.reserved)
    }

    /// Label shown on the canvas
    pub fn display_id(&self) -> &str {
        match &self.resolution {
            Resolution::Virtual { display_id } => display_id,
            Resolution::Matched { .. } => self.stall.display_code(),
        }
    }

    /// Live record size when matched and known, otherwise the authored size
    pub fn effective_size(&self) -> StallSize {
        match self.record() {
            Some(record) if record.size != StallSize::Unknown => record.size,
            _ => self.stall.size,
        }
    }
}

/// A hall of the merged view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedHall {
    pub id: HallId,
    pub name: String,
    pub label: Point,
    pub stalls: Vec<MatchedStall>,
}

/// Merged layout consumed by the view renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchedLayout {
    pub halls: Vec<MatchedHall>,
    pub matched: usize,
    pub virtual_count: usize,
}

impl MatchedLayout {
    pub fn has_stalls(&self) -> bool {
        self.halls.iter().any(|h| !h.stalls.is_empty())
    }

    /// All stalls, hall by hall, in drawing order
    pub fn stalls(&self) -> impl Iterator<Item = &MatchedStall> {
        self.halls.iter().flat_map(|h| h.stalls.iter())
    }

    /// Stall bound to the given record
    pub fn find_by_record(&self, id: &RecordId) -> Option<&MatchedStall> {
        self.stalls().find(|s| s.record().is_some_and(|r| &r.id == id))
    }

    /// Topmost stall under a world point
    pub fn hit_test(&self, world: Point) -> Option<&MatchedStall> {
        self.stalls().filter(|s| s.stall.contains(world)).last()
    }
}

/// Record lookup tables, built once per run
struct RecordIndex<'a> {
    records: &'a [StallRecord],
    exact: HashMap<&'a str, usize>,
    folded: HashMap<String, usize>,
    unpadded: HashMap<String, usize>,
}

impl<'a> RecordIndex<'a> {
    fn build(records: &'a [StallRecord]) -> Self {
        let mut exact = HashMap::new();
        let mut folded = HashMap::new();
        let mut unpadded = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            for key in [record.id.as_str(), record.name.as_str()] {
                if key.is_empty() {
                    continue;
                }
                exact.entry(key).or_insert(i);
                folded.entry(fold_case(key)).or_insert(i);
                unpadded.entry(strip_leading_zeros(key)).or_insert(i);
            }
        }

        Self {
            records,
            exact,
            folded,
            unpadded,
        }
    }

    fn lookup(&self, candidate: &str, ordinal: usize, positional: bool) -> Option<(usize, MatchTier)> {
        if let Some(&i) = self.exact.get(candidate) {
            return Some((i, MatchTier::Exact));
        }
        if let Some(&i) = self.folded.get(&fold_case(candidate)) {
            return Some((i, MatchTier::CaseInsensitive));
        }
        if let Some(&i) = self.unpadded.get(&strip_leading_zeros(candidate)) {
            return Some((i, MatchTier::LeadingZero));
        }
        if positional && ordinal < self.records.len() {
            return Some((ordinal, MatchTier::Positional));
        }
        None
    }
}

fn fold_case(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Uppercase, then drop zeros that lead the string or the numeric run after
/// an alphabetic prefix: `a01` -> `A1`, `007` -> `7`, `B00` -> `B0`
fn strip_leading_zeros(value: &str) -> String {
    let upper = value.trim().to_uppercase();
    let split = upper
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(upper.len());
    let (prefix, digits) = upper.split_at(split);
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() && !digits.is_empty() {
        format!("{}0", prefix)
    } else {
        format!("{}{}", prefix, stripped)
    }
}

/// Binds design stalls to records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallMatcher {
    pub positional_fallback: bool,
}

impl Default for StallMatcher {
    fn default() -> Self {
        Self {
            positional_fallback: true,
        }
    }
}

impl StallMatcher {
    pub fn new(positional_fallback: bool) -> Self {
        Self {
            positional_fallback,
        }
    }

    /// Merge a persisted layout with the record list. Never fails.
    pub fn match_layout(&self, layout: &MapLayout, records: &[StallRecord]) -> MatchedLayout {
        let index = RecordIndex::build(records);
        let mut merged = MatchedLayout::default();
        let mut by_tier: HashMap<MatchTier, usize> = HashMap::new();

        for hall in &layout.halls {
            let mut stalls = Vec::with_capacity(hall.stalls.len());
            for (ordinal, stall) in hall.stalls.iter().enumerate() {
                let candidate = stall.display_code();
                let resolution = match index.lookup(candidate, ordinal, self.positional_fallback) {
                    Some((i, tier)) => {
                        merged.matched += 1;
                        *by_tier.entry(tier).or_default() += 1;
                        Resolution::Matched {
                            record: records[i].clone(),
                            tier,
                        }
                    }
                    None => {
                        merged.virtual_count += 1;
                        Resolution::Virtual {
                            display_id: candidate.to_string(),
                        }
                    }
                };
                stalls.push(MatchedStall {
                    stall: stall.clone(),
                    resolution,
                    ordinal,
                });
            }
            merged.halls.push(MatchedHall {
                id: hall.id.clone(),
                name: hall.name.clone(),
                label: Point::new(hall.label_x, hall.label_y),
                stalls,
            });
        }

        debug!(
            records = records.len(),
            matched = merged.matched,
            virtual_stalls = merged.virtual_count,
            positional = by_tier.get(&MatchTier::Positional).copied().unwrap_or(0),
            "Matched layout against stall records"
        );
        merged
    }

    /// Same as [`match_layout`](Self::match_layout) for a designer snapshot
    pub fn match_model(&self, model: &LayoutModel, records: &[StallRecord]) -> MatchedLayout {
        self.match_layout(&model.to_layout(), records)
    }
}
