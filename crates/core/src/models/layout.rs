//! Persisted map layout - the wire shape of the whole hall/stall tree

use serde::{Deserialize, Serialize};

use super::{Hall, Stall};

/// The full persisted hall/stall tree for one venue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub halls: Vec<Hall>,
}

impl MapLayout {
    pub fn new(halls: Vec<Hall>) -> Self {
        Self { halls }
    }

    /// A layout with no stalls anywhere counts as "not configured"
    pub fn has_stalls(&self) -> bool {
        self.halls.iter().any(|h| !h.stalls.is_empty())
    }

    pub fn stall_count(&self) -> usize {
        self.halls.iter().map(|h| h.stalls.len()).sum()
    }

    /// All stalls in hall order
    pub fn stalls(&self) -> impl Iterator<Item = &Stall> {
        self.halls.iter().flat_map(|h| h.stalls.iter())
    }

    /// Serialize to JSON bytes
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_layout_has_no_stalls() {
        let layout = MapLayout::from_json(r#"{"halls":[]}"#).unwrap();
        assert!(!layout.has_stalls());

        let layout = MapLayout::from_json(r#"{"halls":[{"id":"h","name":"Hall A","stalls":[]}]}"#)
            .unwrap();
        assert!(!layout.has_stalls());
        assert_eq!(layout.stall_count(), 0);
    }

    #[test]
    fn test_missing_halls_key() {
        let layout = MapLayout::from_json("{}").unwrap();
        assert!(layout.halls.is_empty());
    }

    #[test]
    fn test_json_roundtrip_keeps_field_names() {
        let json = r##"{"halls":[{"id":"h1","name":"Hall A","labelX":30,"labelY":40,"stalls":[
            {"id":"s1","stallId":"A01","x":50,"y":50,"width":80,"height":60,
             "size":"MEDIUM","color":"#ff9800","status":"RESERVED","hallId":"h1"}]}]}"##;
        let layout = MapLayout::from_json(json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&layout.to_json().unwrap()).unwrap();
        let hall = &value["halls"][0];
        assert_eq!(hall["labelX"], 30.0);
        assert_eq!(hall["stalls"][0]["stallId"], "A01");
        assert_eq!(hall["stalls"][0]["status"], "RESERVED");
    }
}
