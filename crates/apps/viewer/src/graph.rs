use std::sync::Arc;

use layers::ImageryLayers;
use plugins::component::SceneNode;
use scene::environment::Environment;
use scene::photo_overlay::PhotoView;
use serde::Serialize;

/// Output of one composition pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SceneGraph {
    /// Placeholder shown until the viewport is initialized.
    Loading,
    Scene(SceneContents),
}

impl SceneGraph {
    pub fn contents(&self) -> Option<&SceneContents> {
        match self {
            SceneGraph::Loading => None,
            SceneGraph::Scene(contents) => Some(contents),
        }
    }
}

/// Children in mount order: imagery, widgets, primitives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneContents {
    pub environment: Environment,
    pub imagery: Arc<ImageryLayers>,
    pub widgets: Vec<SceneNode>,
    pub primitives: Vec<PrimitiveNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimitiveNode {
    #[serde(flatten)]
    pub node: SceneNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoView>,
}
