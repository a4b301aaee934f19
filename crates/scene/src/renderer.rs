//! Port to the embedded globe renderer.
//!
//! The viewport never reaches into renderer globals directly. The composition
//! root owns one `Renderer` handle and lends it to the controllers; the camera
//! is written only through [`crate::CameraBridge`] and the selected-entity slot
//! only through [`crate::SelectionController`].

use foundation::camera::{CameraState, Frustum};
use foundation::easing::Easing;
use runtime::listeners::ListenerId;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityInfo, PickedObject};

/// Renderer events the viewport listens for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RendererEventKind {
    CameraMoveEnd,
    Click,
}

/// Renderer event delivered by the host to a mounted viewport.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    CameraMoveEnd,
    Click(Option<PickedObject>),
}

impl RendererEvent {
    pub fn kind(&self) -> RendererEventKind {
        match self {
            RendererEvent::CameraMoveEnd => RendererEventKind::CameraMoveEnd,
            RendererEvent::Click(_) => RendererEventKind::Click,
        }
    }
}

/// Scripted camera flight.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Flight {
    /// Target position and orientation; `fov` is ignored by flights.
    pub destination: CameraState,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Flight {
    pub fn new(destination: CameraState, duration_ms: u64) -> Self {
        Self {
            destination,
            duration_ms,
            easing: Easing::QuadraticInOut,
        }
    }
}

/// Sphere to frame with [`Renderer::fly_to_bounding_sphere`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub lng: f64,
    pub lat: f64,
    pub height: f64,
    pub radius: f64,
}

/// View offset from a bounding sphere's center.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereOffset {
    pub heading: f64,
    pub pitch: f64,
    /// Distance from the sphere center in meters; zero lets the renderer pick.
    pub range: f64,
}

pub trait Renderer {
    /// Current frustum shape, or `None` when no viewer is mounted.
    fn frustum(&self) -> Option<Frustum>;
    /// Live camera position and orientation. `fov` is not populated here.
    fn camera_pose(&self) -> Option<CameraState>;
    fn set_view(&mut self, pose: &CameraState);
    fn set_fov(&mut self, fov: f64);
    fn fly_to(&mut self, flight: &Flight);
    fn fly_to_bounding_sphere(
        &mut self,
        sphere: &BoundingSphere,
        offset: &SphereOffset,
        duration_ms: u64,
    );

    fn entity(&self, id: &str) -> Option<EntityInfo>;
    fn selected_entity(&self) -> Option<EntityId>;
    fn set_selected_entity(&mut self, id: Option<&EntityId>);

    /// Applies the global renderer credential (imagery/terrain access token).
    fn set_access_token(&mut self, token: &str);

    fn subscribe(&mut self, kind: RendererEventKind) -> ListenerId;
    fn unsubscribe(&mut self, id: ListenerId);
}
