//! Scene property bag and the globe environment derived from it.

use foundation::camera::CameraState;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOG_DENSITY: f64 = 2.0e-4;

/// Scene-wide settings authored in the editor. Every field is optional; the
/// resolved values live in [`Environment`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneProperty {
    #[serde(default)]
    pub default: DefaultSettings,
    #[serde(default)]
    pub atmosphere: AtmosphereSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultSettings {
    pub ion: Option<String>,
    pub terrain: Option<bool>,
    pub bgcolor: Option<String>,
    pub camera: Option<CameraState>,
    pub skybox: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereSettings {
    pub fog: Option<bool>,
    pub fog_density: Option<f64>,
    pub enable_sun: Option<bool>,
    pub sky_atmosphere: Option<bool>,
    pub enable_lighting: Option<bool>,
    pub ground_atmosphere: Option<bool>,
    pub surturation_shift: Option<f64>,
    pub hue_shift: Option<f64>,
    pub brightness_shift: Option<f64>,
}

/// Globe, sky, and atmosphere configuration with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    pub terrain: bool,
    pub background_color: Option<String>,
    pub skybox: bool,
    pub fog: bool,
    pub fog_density: f64,
    pub sun: bool,
    pub sky_atmosphere: bool,
    pub lighting: bool,
    pub ground_atmosphere: bool,
    pub saturation_shift: f64,
    pub hue_shift: f64,
    pub brightness_shift: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_property(&SceneProperty::default())
    }
}

impl Environment {
    pub fn from_property(property: &SceneProperty) -> Self {
        let d = &property.default;
        let a = &property.atmosphere;
        Self {
            terrain: d.terrain.unwrap_or(false),
            background_color: d.bgcolor.clone(),
            skybox: d.skybox.unwrap_or(true),
            fog: a.fog.unwrap_or(true),
            fog_density: a.fog_density.unwrap_or(DEFAULT_FOG_DENSITY),
            sun: a.enable_sun.unwrap_or(true),
            sky_atmosphere: a.sky_atmosphere.unwrap_or(true),
            lighting: a.enable_lighting.unwrap_or(false),
            ground_atmosphere: a.ground_atmosphere.unwrap_or(true),
            saturation_shift: a.surturation_shift.unwrap_or(0.0),
            hue_shift: a.hue_shift.unwrap_or(0.0),
            brightness_shift: a.brightness_shift.unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_FOG_DENSITY, Environment, SceneProperty};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_bag_resolves_to_defaults() {
        let env = Environment::default();
        assert!(env.skybox);
        assert!(env.fog);
        assert!(!env.lighting);
        assert!(!env.terrain);
        assert_eq!(env.fog_density, DEFAULT_FOG_DENSITY);
        assert_eq!(env.background_color, None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let property: SceneProperty = serde_json::from_str(
            r##"{
                "default": { "skybox": false, "bgcolor": "#000000", "terrain": true },
                "atmosphere": { "enable_lighting": true, "fog": false, "hue_shift": 0.25 }
            }"##,
        )
        .expect("parse");
        let env = Environment::from_property(&property);
        assert!(!env.skybox);
        assert!(env.terrain);
        assert!(env.lighting);
        assert!(!env.fog);
        assert_eq!(env.hue_shift, 0.25);
        assert_eq!(env.background_color.as_deref(), Some("#000000"));
    }
}
