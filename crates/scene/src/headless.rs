//! In-memory renderer used by tests and by the scenario replay tool.
//!
//! Every command is appended to a log; flights complete instantly.

use std::collections::BTreeMap;

use foundation::camera::{CameraState, DEFAULT_FOV, Frustum};
use runtime::listeners::{ListenerId, ListenerRegistry};
use serde::Serialize;

use crate::entity::{EntityId, EntityInfo};
use crate::renderer::{BoundingSphere, Flight, Renderer, RendererEventKind, SphereOffset};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RendererCommand {
    SetView { pose: CameraState },
    SetFov { fov: f64 },
    FlyTo { destination: CameraState, duration_ms: u64 },
    FlyToBoundingSphere { lng: f64, lat: f64, radius: f64, duration_ms: u64 },
    SelectEntity { id: Option<EntityId> },
    SetAccessToken { token: String },
}

#[derive(Debug)]
pub struct HeadlessRenderer {
    pose: CameraState,
    frustum: Option<Frustum>,
    entities: BTreeMap<EntityId, EntityInfo>,
    selected: Option<EntityId>,
    listeners: ListenerRegistry<RendererEventKind>,
    commands: Vec<RendererCommand>,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            pose: CameraState::new(0.0, 0.0, 20_000_000.0),
            frustum: Some(Frustum::Perspective { fov: DEFAULT_FOV }),
            entities: BTreeMap::new(),
            selected: None,
            listeners: ListenerRegistry::new(),
            commands: Vec::new(),
        }
    }

    pub fn with_pose(mut self, pose: CameraState) -> Self {
        self.pose = CameraState { fov: None, ..pose };
        if let (Some(fov), Some(Frustum::Perspective { .. })) = (pose.fov, self.frustum) {
            self.frustum = Some(Frustum::Perspective { fov });
        }
        self
    }

    pub fn with_frustum(mut self, frustum: Option<Frustum>) -> Self {
        self.frustum = frustum;
        self
    }

    pub fn insert_entity(&mut self, entity: EntityInfo) {
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Moves the camera as if the user dragged the globe. Not logged.
    pub fn user_move(&mut self, pose: CameraState) {
        self.pose = CameraState { fov: None, ..pose };
    }

    pub fn commands(&self) -> &[RendererCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RendererCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn set_view_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RendererCommand::SetView { .. }))
            .count()
    }

    pub fn flights(&self) -> Vec<CameraState> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RendererCommand::FlyTo { destination, .. } => Some(*destination),
                _ => None,
            })
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_listening(&self, kind: RendererEventKind) -> bool {
        self.listeners.count_of(kind) > 0
    }
}

impl Renderer for HeadlessRenderer {
    fn frustum(&self) -> Option<Frustum> {
        self.frustum
    }

    fn camera_pose(&self) -> Option<CameraState> {
        self.frustum.map(|_| self.pose)
    }

    fn set_view(&mut self, pose: &CameraState) {
        self.pose = CameraState { fov: None, ..*pose };
        self.commands.push(RendererCommand::SetView { pose: self.pose });
    }

    fn set_fov(&mut self, fov: f64) {
        if let Some(Frustum::Perspective { .. }) = self.frustum {
            self.frustum = Some(Frustum::Perspective { fov });
        }
        self.commands.push(RendererCommand::SetFov { fov });
    }

    fn fly_to(&mut self, flight: &Flight) {
        let destination = CameraState {
            fov: None,
            ..flight.destination
        };
        self.pose = destination;
        self.commands.push(RendererCommand::FlyTo {
            destination,
            duration_ms: flight.duration_ms,
        });
    }

    fn fly_to_bounding_sphere(
        &mut self,
        sphere: &BoundingSphere,
        offset: &SphereOffset,
        duration_ms: u64,
    ) {
        let range = if offset.range > 0.0 {
            offset.range
        } else {
            sphere.radius * 3.0
        };
        self.pose = CameraState::new(sphere.lng, sphere.lat, sphere.height + range)
            .with_orientation(offset.heading, offset.pitch, 0.0);
        self.commands.push(RendererCommand::FlyToBoundingSphere {
            lng: sphere.lng,
            lat: sphere.lat,
            radius: sphere.radius,
            duration_ms,
        });
    }

    fn entity(&self, id: &str) -> Option<EntityInfo> {
        self.entities.get(&EntityId::new(id)).cloned()
    }

    fn selected_entity(&self) -> Option<EntityId> {
        self.selected.clone()
    }

    fn set_selected_entity(&mut self, id: Option<&EntityId>) {
        self.selected = id.cloned();
        self.commands.push(RendererCommand::SelectEntity { id: id.cloned() });
    }

    fn set_access_token(&mut self, token: &str) {
        self.commands.push(RendererCommand::SetAccessToken {
            token: token.to_string(),
        });
    }

    fn subscribe(&mut self, kind: RendererEventKind) -> ListenerId {
        self.listeners.subscribe(kind)
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }
}
