use std::sync::Arc;

use foundation::camera::CameraState;
use layers::Layer;
use scene::environment::SceneProperty;
use scene::renderer::{BoundingSphere, SphereOffset};
use scene::selection::SelectionState;
use serde::Serialize;
use serde_json::Value;

/// Props every resolved component receives, built-in or remote.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentProps {
    /// Layer or widget id.
    pub id: String,
    pub plugin_id: String,
    pub extension_id: String,
    pub is_editable: bool,
    pub is_built: bool,
    pub is_editing: bool,
    pub is_visible: bool,
    pub is_selected: bool,
    pub property: Value,
    pub plugin_property: Value,
    pub scene_property: Arc<SceneProperty>,
    pub selection: SelectionState,
    /// Base URL of a remote plugin, for resolving relative assets.
    pub plugin_base_url: Option<String>,
}

impl ComponentProps {
    pub fn new(id: impl Into<String>, plugin_id: &str, extension_id: &str) -> Self {
        Self {
            id: id.into(),
            plugin_id: plugin_id.to_string(),
            extension_id: extension_id.to_string(),
            is_editable: false,
            is_built: false,
            is_editing: false,
            is_visible: true,
            is_selected: false,
            property: Value::Null,
            plugin_property: Value::Null,
            scene_property: Arc::new(SceneProperty::default()),
            selection: SelectionState::default(),
            plugin_base_url: None,
        }
    }

    /// `property.default.<key>`, the group built-in extensions author into.
    pub fn default_field(&self, key: &str) -> Option<&Value> {
        self.property.get("default")?.get(key)
    }
}

/// Node of the composed scene graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub key: String,
    pub element: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
    pub attributes: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl SceneNode {
    pub fn new(key: impl Into<String>, element: impl Into<String>, attributes: Value) -> Self {
        Self {
            key: key.into(),
            element: element.into(),
            selected: false,
            attributes,
            base_url: None,
        }
    }
}

/// Capabilities a component may use from its event handlers.
pub trait PluginApi {
    fn selection(&self) -> SelectionState;
    fn select(&mut self, id: Option<&str>, reason: Option<&str>);
    fn layer(&self, id: &str) -> Option<Layer>;
    fn camera(&self) -> Option<CameraState>;
    fn fly_to(&mut self, destination: &CameraState, duration_ms: u64);
    fn fly_to_sphere(&mut self, sphere: &BoundingSphere, offset: &SphereOffset, duration_ms: u64);
}

/// A renderable primitive or widget.
pub trait Component: std::fmt::Debug + Send + Sync {
    /// Returns `None` when the props are not renderable (for example a marker
    /// without a location).
    fn render(&self, props: &ComponentProps) -> Option<SceneNode>;

    /// Click on the rendered element. Primitives select their own layer.
    fn handle_click(&self, props: &ComponentProps, api: &mut dyn PluginApi) {
        api.select(Some(&props.id), None);
    }
}
