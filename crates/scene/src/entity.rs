use serde::{Deserialize, Serialize};

use crate::properties::PropertyBag;

/// Renderer-native entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Snapshot of a renderer entity as seen by the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub id: EntityId,
    #[serde(default)]
    pub properties: PropertyBag,
}

impl EntityInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(id),
            properties: PropertyBag::default(),
        }
    }

    pub fn with_properties(mut self, properties: PropertyBag) -> Self {
        self.properties = properties;
        self
    }

    /// Whether a renderer click may select this entity.
    pub fn is_click_selectable(&self) -> bool {
        !self.properties.is_unselectable()
    }
}

/// Result of a renderer pick under the pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PickedObject {
    Entity(EntityInfo),
    /// Globe surface, tiles, or any primitive that is not an entity.
    Other,
}
