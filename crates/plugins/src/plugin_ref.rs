use foundation::encode::encode_uri_component;
use layers::Layer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::widget::Widget;

/// Plugin id reserved for components compiled into the viewer.
pub const BUILTIN_PLUGIN_ID: &str = "reearth";

/// File fetched from a remote plugin's base URL.
pub const MODULE_FILE_NAME: &str = "index.js";

/// Which export namespace of a plugin module a component comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtensionKind {
    Primitive,
    Widget,
}

impl ExtensionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtensionKind::Primitive => "primitives",
            ExtensionKind::Widget => "widgets",
        }
    }
}

/// Identifies the component that renders a layer or widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRef {
    pub plugin_id: Option<String>,
    pub extension_id: Option<String>,
    #[serde(default)]
    pub property: Value,
    #[serde(default)]
    pub plugin_property: Value,
}

impl PluginRef {
    pub fn new(plugin_id: &str, extension_id: &str) -> Self {
        Self {
            plugin_id: Some(plugin_id.to_string()),
            extension_id: Some(extension_id.to_string()),
            property: Value::Null,
            plugin_property: Value::Null,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.plugin_id.as_deref() == Some(BUILTIN_PLUGIN_ID)
    }
}

impl From<&Layer> for PluginRef {
    fn from(layer: &Layer) -> Self {
        Self {
            plugin_id: layer.plugin_id.clone(),
            extension_id: layer.extension_id.clone(),
            property: layer.property.clone(),
            plugin_property: layer.plugin_property.clone(),
        }
    }
}

impl From<&Widget> for PluginRef {
    fn from(widget: &Widget) -> Self {
        Self {
            plugin_id: widget.plugin_id.clone(),
            extension_id: widget.extension_id.clone(),
            property: widget.property.clone(),
            plugin_property: widget.plugin_property.clone(),
        }
    }
}

/// A remote plugin id of the form `id#version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePluginId<'a> {
    pub id: &'a str,
    pub version: &'a str,
}

impl<'a> RemotePluginId<'a> {
    /// Returns `None` unless both halves are present and non-empty.
    pub fn parse(plugin_id: &'a str) -> Option<Self> {
        let (id, version) = plugin_id.split_once('#')?;
        if id.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self { id, version })
    }
}

/// Plugin hosts for each extension kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginHosts {
    pub primitives: String,
    pub widgets: String,
}

impl Default for PluginHosts {
    fn default() -> Self {
        Self {
            primitives: "/plugins/primitives".to_string(),
            widgets: "/plugins/widgets".to_string(),
        }
    }
}

impl PluginHosts {
    pub fn host(&self, kind: ExtensionKind) -> &str {
        match kind {
            ExtensionKind::Primitive => &self.primitives,
            ExtensionKind::Widget => &self.widgets,
        }
    }

    /// `{host}/{id}/{version}` with both segments URI-encoded.
    pub fn base_url(&self, kind: ExtensionKind, plugin: &RemotePluginId<'_>) -> String {
        format!(
            "{}/{}/{}",
            self.host(kind).trim_end_matches('/'),
            encode_uri_component(plugin.id),
            encode_uri_component(plugin.version)
        )
    }
}

pub fn module_url(base_url: &str) -> String {
    format!("{base_url}/{MODULE_FILE_NAME}")
}
