use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scene layer rendered by a plugin primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    #[serde(default)]
    pub title: String,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
    pub plugin_id: Option<String>,
    pub extension_id: Option<String>,
    #[serde(default)]
    pub property: Value,
    #[serde(default)]
    pub plugin_property: Value,
}

fn visible_by_default() -> bool {
    true
}

impl Layer {
    pub fn new(id: impl Into<String>, plugin_id: &str, extension_id: &str) -> Self {
        Self {
            id: LayerId::new(id),
            title: String::new(),
            is_visible: true,
            plugin_id: Some(plugin_id.to_string()),
            extension_id: Some(extension_id.to_string()),
            property: Value::Null,
            plugin_property: Value::Null,
        }
    }

    pub fn with_property(mut self, property: Value) -> Self {
        self.property = property;
        self
    }
}

/// Read access to the scene's layers by id.
pub trait LayerLookup {
    fn layer(&self, id: &str) -> Option<&Layer>;
}

impl LayerLookup for [Layer] {
    fn layer(&self, id: &str) -> Option<&Layer> {
        self.iter().find(|l| l.id.as_str() == id)
    }
}

impl LayerLookup for Vec<Layer> {
    fn layer(&self, id: &str) -> Option<&Layer> {
        self.as_slice().layer(id)
    }
}
