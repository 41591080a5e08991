//! Scene configuration.
//!
//! Every field has a default, so a YAML file only needs the values it
//! overrides.

use glam::Vec3;
use haunt_common::Color;
use haunt_kernel::{Environment, ShadowConfig};
use haunt_render::{OrbitControls, PerspectiveCamera};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{field}: expected {min} < {max}")]
    InvalidRange { field: &'static str, min: f32, max: f32 },
    #[error("{field}: {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{0} must be positive")]
    NotPositive(&'static str),
}

/// Where texture and model files live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub root: PathBuf,
    /// Extension appended to every texture path (`webp` or `jpg`).
    pub texture_extension: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
            texture_extension: "webp".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BushConfig {
    pub scale: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseConfig {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub rotation_y: f32,
    pub bush_color: Color,
    pub bush_rotation_x: f32,
    pub bushes: Vec<BushConfig>,
    pub door_size: f32,
    pub door_segments: u32,
    pub door_height: f32,
    pub door_displacement_scale: f32,
    pub door_displacement_bias: f32,
    pub door_light_color: Color,
    pub door_light_intensity: f32,
    pub door_light_position: Vec3,
}

impl Default for HouseConfig {
    fn default() -> Self {
        let bush = |scale, x, y, z| BushConfig {
            scale,
            position: Vec3::new(x, y, z),
        };
        Self {
            width: 4.0,
            height: 2.5,
            depth: 4.0,
            rotation_y: PI * 0.05,
            bush_color: hex("#89c854"),
            bush_rotation_x: -0.75,
            bushes: vec![
                bush(0.5, 1.4, 0.1, 2.5),
                bush(0.25, 2.1, 0.1, 2.1),
                bush(0.4, -1.0, 0.1, 2.5),
                bush(0.15, -2.0, 0.1, 2.5),
            ],
            door_size: 2.2,
            door_segments: 100,
            door_height: 1.0,
            door_displacement_scale: 0.15,
            door_displacement_bias: -0.04,
            door_light_color: hex("#ff7d46"),
            door_light_intensity: 0.4,
            door_light_position: Vec3::new(0.0, 2.2, 2.7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraveConfig {
    pub count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    pub y: f32,
    pub size: Vec3,
    /// Half-ranges of the random rotation about x, y and z.
    pub tilt: Vec3,
}

impl GraveConfig {
    /// Radii must form a finite, non-empty range and tilts must lie in [0, π].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min_radius, self.max_radius);
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(ConfigError::InvalidRange {
                field: "graves.radius",
                min,
                max,
            });
        }
        for (field, value) in [
            ("graves.tilt.x", self.tilt.x),
            ("graves.tilt.y", self.tilt.y),
            ("graves.tilt.z", self.tilt.z),
        ] {
            if !(0.0..=PI).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: PI,
                });
            }
        }
        Ok(())
    }
}

impl Default for GraveConfig {
    fn default() -> Self {
        Self {
            count: 30,
            min_radius: 4.0,
            max_radius: 10.0,
            y: 0.3,
            size: Vec3::new(0.6, 0.8, 0.2),
            tilt: Vec3::new(0.1, 0.2, 0.2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub size: f32,
    pub segments: u32,
    pub repeat: f32,
    pub displacement_scale: f32,
    pub displacement_bias: f32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            size: 20.0,
            segments: 50,
            repeat: 8.0,
            displacement_scale: 0.3,
            displacement_bias: -0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient_color: Color,
    pub ambient_intensity: f32,
    pub directional_color: Color,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
    pub shadow: ShadowConfig,
}

impl Default for LightsConfig {
    fn default() -> Self {
        let moonlight = hex("#86cdff");
        Self {
            ambient_color: moonlight,
            ambient_intensity: 0.3,
            directional_color: moonlight,
            directional_intensity: 1.0,
            directional_position: Vec3::new(3.0, 2.0, -8.0),
            shadow: ShadowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub damping: bool,
    pub damping_factor: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(5.0, 3.0, 8.0),
            target: Vec3::ZERO,
            damping: true,
            damping_factor: 0.05,
            min_polar_angle: 0.0,
            max_polar_angle: PI / 2.0,
        }
    }
}

impl CameraConfig {
    /// Camera at the configured position, looking at the target.
    pub fn camera(&self, aspect: f32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(self.fov, aspect, self.near, self.far);
        camera.position = self.position;
        camera.look_at(self.target);
        camera
    }

    pub fn orbit_controls(&self) -> OrbitControls {
        OrbitControls::new(self.target)
            .with_polar_range(self.min_polar_angle, self.max_polar_angle)
            .with_damping(self.damping, self.damping_factor)
    }
}

/// Placement applied to a model when its load completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPlacement {
    /// Path relative to the asset root.
    pub path: PathBuf,
    pub scale: f32,
    pub position: Vec3,
    pub rotation_y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub tree: ModelPlacement,
    pub ghost: ModelPlacement,
    pub ghost_opacity: f32,
    pub ghost_emissive: Color,
    pub ghost_emissive_intensity: f32,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            tree: ModelPlacement {
                path: PathBuf::from("tree/tree.glb"),
                scale: 15.0,
                position: Vec3::new(-7.0, 0.0, 0.0),
                rotation_y: PI,
            },
            ghost: ModelPlacement {
                path: PathBuf::from("ghost/ghost.glb"),
                scale: 0.4,
                position: Vec3::new(0.0, 0.25, 3.0),
                rotation_y: 0.0,
            },
            ghost_opacity: 0.1,
            ghost_emissive: Color::rgb(0.0, 1.0, 1.0),
            ghost_emissive_intensity: 2.0,
        }
    }
}

/// Every constant the assembler builds the scene from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub assets: AssetsConfig,
    pub house: HouseConfig,
    pub graves: GraveConfig,
    pub floor: FloorConfig,
    pub lights: LightsConfig,
    pub environment: Environment,
    pub camera: CameraConfig,
    pub models: ModelsConfig,
}

impl SceneConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::info!("loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    // Negated comparisons so NaN fails every check.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.graves.validate()?;
        if !(self.camera.min_polar_angle < self.camera.max_polar_angle) {
            return Err(ConfigError::InvalidRange {
                field: "camera.polar_angle",
                min: self.camera.min_polar_angle,
                max: self.camera.max_polar_angle,
            });
        }
        if !(self.camera.near > 0.0) {
            return Err(ConfigError::NotPositive("camera.near"));
        }
        if self.lights.shadow.map_size == 0 {
            return Err(ConfigError::NotPositive("lights.shadow.map_size"));
        }
        Ok(())
    }

    /// Resolve a path relative to the asset root.
    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.assets.root.join(relative)
    }
}

fn hex(s: &str) -> Color {
    Color::from_hex(s).unwrap_or(Color::WHITE)
}
