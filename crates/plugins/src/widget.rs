use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Screen-space overlay contributed by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub plugin_id: Option<String>,
    pub extension_id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub property: Value,
    #[serde(default)]
    pub plugin_property: Value,
}

impl Widget {
    pub fn new(id: impl Into<String>, plugin_id: &str, extension_id: &str) -> Self {
        Self {
            id: id.into(),
            plugin_id: Some(plugin_id.to_string()),
            extension_id: Some(extension_id.to_string()),
            enabled: true,
            property: Value::Null,
            plugin_property: Value::Null,
        }
    }

    pub fn with_property(mut self, property: Value) -> Self {
        self.property = property;
        self
    }
}
