//! Hall model - a named group of stalls with a movable label

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::Stall;

/// Default label anchor used when a persisted hall has none
pub const DEFAULT_LABEL_X: f64 = 20.0;
pub const DEFAULT_LABEL_Y: f64 = 20.0;

/// Stall code prefix used when a hall name has no uppercase letter
pub const DEFAULT_PREFIX: char = 'A';

/// Opaque hall identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HallId(pub String);

impl HallId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(format!("hall-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A Hall as it appears in the persisted layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hall {
    pub id: HallId,
    pub name: String,
    #[serde(default = "default_label_x", deserialize_with = "label_x")]
    pub label_x: f64,
    #[serde(default = "default_label_y", deserialize_with = "label_y")]
    pub label_y: f64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub stalls: Vec<Stall>,
}

impl Hall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HallId::generate(),
            name: name.into(),
            label_x: DEFAULT_LABEL_X,
            label_y: DEFAULT_LABEL_Y,
            stalls: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: HallId) -> Self {
        self.id = id;
        self
    }

    /// Stall code prefix derived from the hall name
    pub fn prefix(&self) -> char {
        hall_prefix(&self.name)
    }
}

/// Derive the stall code prefix from a hall name.
///
/// A standalone single-letter word wins ("Hall B" -> 'B'), otherwise the
/// first uppercase letter ("Books" -> 'B'), otherwise [`DEFAULT_PREFIX`].
pub fn hall_prefix(name: &str) -> char {
    let standalone = name.split_whitespace().rev().find_map(|word| {
        let mut chars = word.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Some(c),
            _ => None,
        }
    });

    standalone
        .or_else(|| name.chars().find(|c| c.is_ascii_uppercase()))
        .unwrap_or(DEFAULT_PREFIX)
}

fn default_label_x() -> f64 {
    DEFAULT_LABEL_X
}

fn default_label_y() -> f64 {
    DEFAULT_LABEL_Y
}

fn label_x<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_LABEL_X))
}

fn label_y<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_LABEL_Y))
}
