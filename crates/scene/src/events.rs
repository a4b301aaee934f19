use foundation::camera::CameraState;
use serde::Serialize;

use crate::entity::EntityId;

/// Notifications flowing from the viewport back up to the host application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ViewportEvent {
    /// Selection changed through the viewport (UI request or renderer pick).
    /// Carries the id only; the selection reason stays internal.
    Selected(Option<EntityId>),
    /// The renderer camera settled on a new pose.
    CameraChanged(CameraState),
    /// A layer's primitive was clicked.
    LayerClicked { layer_id: String },
}
