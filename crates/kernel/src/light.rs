use glam::{Mat4, Vec3};
use haunt_common::Color;
use serde::{Deserialize, Serialize};

/// Shadow camera and map settings for a directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub map_size: u32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    /// Depth offset subtracted before comparison.
    pub bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 256,
            left: -10.0,
            right: 10.0,
            top: 8.0,
            bottom: -8.0,
            near: 1.0,
            far: 20.0,
            bias: 0.001,
        }
    }
}

/// Uniform light from every direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Parallel light shining from the node's world position toward `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub target: Vec3,
    pub shadow: Option<ShadowConfig>,
}

impl DirectionalLight {
    /// Unit vector from the light toward its target.
    pub fn direction(&self, position: Vec3) -> Vec3 {
        let dir = self.target - position;
        if dir.length_squared() < f32::EPSILON {
            Vec3::NEG_Y
        } else {
            dir.normalize()
        }
    }

    /// Orthographic view-projection used to render the shadow map.
    ///
    /// Returns `None` when the light does not cast shadows.
    pub fn light_view_projection(&self, position: Vec3) -> Option<Mat4> {
        let shadow = self.shadow?;
        let dir = self.direction(position);
        let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(position, self.target, up);
        let projection = Mat4::orthographic_rh(
            shadow.left,
            shadow.right,
            shadow.bottom,
            shadow.top,
            shadow.near,
            shadow.far,
        );
        Some(projection * view)
    }
}

/// Omnidirectional light with physical falloff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    /// Cutoff range; zero means unlimited.
    pub distance: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            distance: 0.0,
            decay: 2.0,
        }
    }

    /// Irradiance scale at `d` world units.
    pub fn attenuation(&self, d: f32) -> f32 {
        let falloff = 1.0 / d.powf(self.decay).max(0.01);
        if self.distance > 0.0 {
            let ratio = (d / self.distance).powi(4);
            let window = (1.0 - ratio).clamp(0.0, 1.0);
            falloff * window * window
        } else {
            falloff
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    Ambient(AmbientLight),
    Directional(DirectionalLight),
    Point(PointLight),
}

impl Light {
    pub fn color(&self) -> Color {
        match self {
            Light::Ambient(l) => l.color,
            Light::Directional(l) => l.color,
            Light::Point(l) => l.color,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient(l) => l.intensity,
            Light::Directional(l) => l.intensity,
            Light::Point(l) => l.intensity,
        }
    }

    pub fn casts_shadow(&self) -> bool {
        matches!(self, Light::Directional(DirectionalLight { shadow: Some(_), .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_light_inverse_square() {
        let light = PointLight::new(Color::WHITE, 5.0);
        assert!((light.attenuation(2.0) - 0.25).abs() < 1e-6);
        // Clamped near the source.
        assert!((light.attenuation(0.0) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn point_light_distance_cutoff() {
        let light = PointLight {
            distance: 4.0,
            ..PointLight::new(Color::WHITE, 1.0)
        };
        assert_eq!(light.attenuation(5.0), 0.0);
        assert!(light.attenuation(1.0) > 0.0);
    }

    #[test]
    fn shadow_projection_maps_target_into_clip_space() {
        let light = DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            target: Vec3::ZERO,
            shadow: Some(ShadowConfig::default()),
        };
        let vp = light
            .light_view_projection(Vec3::new(3.0, 2.0, -8.0))
            .unwrap();
        let clip = vp.project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn no_shadow_no_projection() {
        let light = DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            target: Vec3::ZERO,
            shadow: None,
        };
        assert!(light.light_view_projection(Vec3::ONE).is_none());
        assert!(!Light::Directional(light).casts_shadow());
    }
}
