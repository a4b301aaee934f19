use serde::{Deserialize, Serialize};

/// Field of view used whenever a camera pose does not carry one (60°).
pub const DEFAULT_FOV: f64 = std::f64::consts::FRAC_PI_3;

/// Renderer camera pose.
///
/// Position is geodetic (`lng`/`lat` in radians, `altitude` in meters); orientation
/// and field of view are radians. Equality is structural with no tolerance.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraState {
    pub lng: f64,
    pub lat: f64,
    pub altitude: f64,
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<f64>,
}

impl CameraState {
    pub fn new(lng: f64, lat: f64, altitude: f64) -> Self {
        Self {
            lng,
            lat,
            altitude,
            ..Self::default()
        }
    }

    pub fn with_orientation(mut self, heading: f64, pitch: f64, roll: f64) -> Self {
        self.heading = heading;
        self.pitch = pitch;
        self.roll = roll;
        self
    }

    pub fn with_fov(mut self, fov: f64) -> Self {
        self.fov = Some(fov);
        self
    }

    /// Field of view, falling back to [`DEFAULT_FOV`].
    pub fn fov_or_default(&self) -> f64 {
        self.fov.unwrap_or(DEFAULT_FOV)
    }
}

/// Projection shape of the renderer's camera frustum.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Frustum {
    Perspective { fov: f64 },
    Orthographic,
}

impl Frustum {
    pub fn is_perspective(&self) -> bool {
        matches!(self, Frustum::Perspective { .. })
    }

    pub fn fov(&self) -> Option<f64> {
        match self {
            Frustum::Perspective { fov } => Some(*fov),
            Frustum::Orthographic => None,
        }
    }
}
