use foundation::camera::CameraState;
use layers::{Layer, TileLayerSpec};
use plugins::widget::Widget;
use scene::environment::SceneProperty;
use serde::{Deserialize, Serialize};

/// Application state the host hands to the viewport on every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportProps {
    /// Gates the one-time initialization; nothing mounts until it is set.
    pub initial_load: bool,
    pub scene_property: SceneProperty,
    pub camera: Option<CameraState>,
    pub selected_layer_id: Option<String>,
    pub layers: Vec<Layer>,
    pub widgets: Vec<Widget>,
    pub tiles: Vec<TileLayerSpec>,
    pub is_editable: bool,
    pub is_building: bool,
}
