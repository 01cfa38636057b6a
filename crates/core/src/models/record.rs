//! Authoritative stall records owned by the reservation service

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize, Serializer};

use super::StallSize;

/// Record identifier; the service sends numbers, older payloads send strings.
///
/// Equality and hashing look only at the textual form, so `12` and `"12"`
/// name the same record. Serialization writes back the kind that was read.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawRecordId")]
pub struct RecordId {
    value: String,
    numeric: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecordId {
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<RawRecordId> for RecordId {
    fn from(raw: RawRecordId) -> Self {
        match raw {
            RawRecordId::Int(n) => n.into(),
            RawRecordId::Float(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                (n as i64).into()
            }
            RawRecordId::Float(n) => RecordId {
                value: n.to_string(),
                numeric: false,
            },
            RawRecordId::Str(s) => RecordId {
                value: s,
                numeric: false,
            },
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value.parse::<i64>() {
            Ok(n) if self.numeric => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.value),
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId {
            value: value.to_string(),
            numeric: true,
        }
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId {
            value: value.to_string(),
            numeric: false,
        }
    }
}

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A reservable stall as known to the reservation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StallRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default)]
    pub size: StallSize,
    #[serde(default)]
    pub reserved: bool,
    /// Comma-joined genre list
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub genres: String,
}

impl StallRecord {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>, size: StallSize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size,
            reserved: false,
            genres: String::new(),
        }
    }

    pub fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }

    pub fn genre_list(&self) -> Vec<&str> {
        self.genres
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_ids() {
        let a: StallRecord =
            serde_json::from_str(r#"{"id":12,"name":"A01","size":"SMALL","reserved":true}"#)
                .unwrap();
        let b: StallRecord = serde_json::from_str(r#"{"id":"12","name":"A01"}"#).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.as_str(), "12");
        assert!(a.reserved);
        assert!(!b.reserved);
    }

    #[test]
    fn test_id_kind_survives_serialization() {
        let numeric: StallRecord = serde_json::from_str(r#"{"id":12,"name":"A01"}"#).unwrap();
        let text: StallRecord = serde_json::from_str(r#"{"id":"12","name":"A01"}"#).unwrap();
        let float: StallRecord = serde_json::from_str(r#"{"id":7.0,"name":"A02"}"#).unwrap();

        let json = serde_json::to_value(&numeric).unwrap();
        assert_eq!(json["id"], serde_json::json!(12));
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["id"], serde_json::json!("12"));
        let json = serde_json::to_value(&float).unwrap();
        assert_eq!(json["id"], serde_json::json!(7));

        let mut ids = std::collections::HashSet::new();
        ids.insert(numeric.id.clone());
        assert!(ids.contains(&text.id));
        assert_eq!(
            serde_json::to_value(RecordId::from(5_i64)).unwrap(),
            serde_json::json!(5)
        );
    }

    #[test]
    fn test_genre_list() {
        let mut record = StallRecord::new("1", "A01", StallSize::Small);
        record.genres = "Fiction, Poetry,,Science ".into();
        assert_eq!(record.genre_list(), vec!["Fiction", "Poetry", "Science"]);
    }

    #[test]
    fn test_null_genres() {
        let record: StallRecord =
            serde_json::from_str(r#"{"id":3,"name":"B02","genres":null}"#).unwrap();
        assert!(record.genres.is_empty());
    }
}
