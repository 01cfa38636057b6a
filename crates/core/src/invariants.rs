//! Layout validation and developer guardrails
//!
//! `validate_layout` runs on every layout entering the system and rejects
//! data that would render orphaned or ambiguous stalls. The `assert_*`
//! helpers are debug assertions for impossible arena states; they are
//! compiled out in release builds.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::layout::LayoutModel;
use crate::models::{Hall, MapLayout, Stall};

/// Check a persisted layout before it is turned into a [`LayoutModel`]
pub fn validate_layout(layout: &MapLayout) -> Result<()> {
    let mut hall_ids = HashSet::new();
    for hall in &layout.halls {
        if !hall_ids.insert(&hall.id) {
            return Err(Error::InvalidLayout(format!(
                "duplicate hall id '{}'",
                hall.id
            )));
        }
    }

    let mut stall_ids = HashSet::new();
    for hall in &layout.halls {
        validate_hall(hall)?;
        for stall in &hall.stalls {
            if !hall_ids.contains(&stall.hall_id) {
                return Err(Error::InvalidLayout(format!(
                    "stall '{}' references missing hall '{}'",
                    stall.id, stall.hall_id
                )));
            }
            if stall.hall_id != hall.id {
                return Err(Error::InvalidLayout(format!(
                    "stall '{}' is listed under hall '{}' but references hall '{}'",
                    stall.id, hall.id, stall.hall_id
                )));
            }
            if !stall_ids.insert(&stall.id) {
                return Err(Error::InvalidLayout(format!(
                    "duplicate stall id '{}'",
                    stall.id
                )));
            }
            validate_geometry(stall)?;
        }
    }

    Ok(())
}

fn validate_hall(hall: &Hall) -> Result<()> {
    if hall.name.trim().is_empty() {
        return Err(Error::InvalidLayout(format!("hall '{}' has no name", hall.id)));
    }
    if !hall.label_x.is_finite() || !hall.label_y.is_finite() {
        return Err(Error::InvalidLayout(format!(
            "hall '{}' has a non-finite label position",
            hall.id
        )));
    }
    Ok(())
}

fn validate_geometry(stall: &Stall) -> Result<()> {
    let values = [stall.x, stall.y, stall.width, stall.height];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(Error::InvalidLayout(format!(
            "stall '{}' has negative or non-finite geometry",
            stall.id
        )));
    }
    Ok(())
}

/// Validate that the arena is internally consistent
pub fn assert_layout_invariants(model: &LayoutModel) {
    if !cfg!(debug_assertions) {
        return;
    }

    let mut listed = 0;
    for hall in model.halls() {
        debug_assert!(
            !hall.name.trim().is_empty(),
            "Hall {} has empty name",
            hall.id
        );

        for stall_id in hall.stall_ids() {
            let stall = model.stall(stall_id);
            debug_assert!(
                stall.is_some(),
                "Hall {} lists missing stall {}",
                hall.id,
                stall_id
            );
            if let Some(stall) = stall {
                debug_assert!(
                    stall.hall_id == hall.id,
                    "Stall {} is listed under hall {} but points at {}",
                    stall.id,
                    hall.id,
                    stall.hall_id
                );
            }
            listed += 1;
        }
    }

    debug_assert!(
        listed == model.stall_count(),
        "Halls list {} stalls but the arena holds {}",
        listed,
        model.stall_count()
    );
    debug_assert!(
        model.halls().count() == model.hall_count(),
        "Hall order and hall map disagree"
    );
}
