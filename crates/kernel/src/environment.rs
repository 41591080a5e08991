use glam::Vec3;
use haunt_common::Color;
use serde::{Deserialize, Serialize};

/// Parameters of the analytic daylight sky.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyParams {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub sun_position: Vec3,
    /// Uniform scale of the sky box.
    pub scale: f32,
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            turbidity: 3.0,
            rayleigh: 10.0,
            mie_coefficient: 0.1,
            mie_directional_g: 0.95,
            sun_position: Vec3::new(0.8, -0.05, -2.0),
            scale: 100.0,
        }
    }
}

pub const DEFAULT_FOG_HEX: &str = "#06343f";

/// Exponential-squared fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fog {
    pub color: Color,
    pub density: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: Color::from_hex(DEFAULT_FOG_HEX).unwrap_or(Color::BLACK),
            density: 0.1,
        }
    }
}

impl Fog {
    /// Blend weight toward the fog colour at view depth `depth`.
    pub fn factor(&self, depth: f32) -> f32 {
        let dz = self.density * depth;
        (1.0 - (-dz * dz).exp()).clamp(0.0, 1.0)
    }
}

/// Sky and fog, shared by every draw.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub sky: SkyParams,
    pub fog: Fog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_factor_grows_with_depth() {
        let fog = Fog::default();
        assert_eq!(fog.factor(0.0), 0.0);
        let near = fog.factor(5.0);
        let far = fog.factor(20.0);
        assert!(near > 0.0 && near < far);
        assert!((near - (1.0 - (-0.25f32).exp())).abs() < 1e-6);
        assert!(far > 0.98);
    }

    #[test]
    fn default_fog_color_is_scene_teal() {
        assert_eq!(Fog::default().color.to_hex(), "#06343f");
    }
}
