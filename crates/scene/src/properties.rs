use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved property key marking an entity as excluded from click-selection.
///
/// Only the presence of the key matters; its value is never inspected.
pub const UNSELECTABLE_TAG: &str = "__reearth_unselectable";

/// Entity property bag, sorted by key for stable iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    pub pairs: BTreeMap<String, Value>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.pairs.insert(key.into(), value.into());
        self
    }

    /// Property bag carrying the non-selectable tag.
    pub fn unselectable() -> Self {
        Self::new().with(UNSELECTABLE_TAG, true)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.contains_key(key)
    }

    pub fn is_unselectable(&self) -> bool {
        self.contains(UNSELECTABLE_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyBag, UNSELECTABLE_TAG};

    #[test]
    fn tag_check_is_presence_only() {
        assert!(!PropertyBag::new().is_unselectable());
        assert!(PropertyBag::unselectable().is_unselectable());
        assert!(
            PropertyBag::new()
                .with(UNSELECTABLE_TAG, false)
                .is_unselectable()
        );
    }

    #[test]
    fn deserializes_from_plain_object() {
        let bag: PropertyBag =
            serde_json::from_str(r#"{"name":"pin","__reearth_unselectable":1}"#).expect("parse");
        assert_eq!(bag.get("name").and_then(|v| v.as_str()), Some("pin"));
        assert!(bag.is_unselectable());
    }
}
