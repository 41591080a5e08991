//! Value ranges and apply logic for the debug panel sliders.

use crate::ToolsError;
use glam::Vec3;
use haunt_assets::MaterialHandle;
use haunt_kernel::Scene;
use haunt_render::PerspectiveCamera;

/// A slider range: values are clamped to `[min, max]` and snapped to `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweakRange {
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl TweakRange {
    pub const fn new(label: &'static str, min: f32, max: f32, step: f32) -> Self {
        Self {
            label,
            min,
            max,
            step,
        }
    }

    /// Clamp into range and snap to the nearest step counted from `min`.
    pub fn apply(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 || clamped == self.min || clamped == self.max {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub const FLOOR_DISPLACEMENT_SCALE: TweakRange =
    TweakRange::new("floor displacement scale", 0.1, 1.0, 0.01);
pub const FLOOR_DISPLACEMENT_BIAS: TweakRange =
    TweakRange::new("floor displacement bias", -2.0, 1.0, 0.01);
pub const CAMERA_AXIS: TweakRange = TweakRange::new("camera", -10.0, 10.0, 0.01);

/// Floor displacement as edited in the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorTweaks {
    pub displacement_scale: f32,
    pub displacement_bias: f32,
}

impl FloorTweaks {
    pub fn read(scene: &Scene, material: MaterialHandle) -> Option<Self> {
        scene.assets.material(material).map(|m| Self {
            displacement_scale: m.displacement_scale,
            displacement_bias: m.displacement_bias,
        })
    }

    /// Write the clamped values into the floor material. Returns what was applied.
    pub fn apply(&self, scene: &mut Scene, material: MaterialHandle) -> Result<Self, ToolsError> {
        let applied = Self {
            displacement_scale: FLOOR_DISPLACEMENT_SCALE.apply(self.displacement_scale),
            displacement_bias: FLOOR_DISPLACEMENT_BIAS.apply(self.displacement_bias),
        };
        let floor = scene
            .assets
            .material_mut(material)
            .ok_or(ToolsError::MaterialNotFound(material.0))?;
        floor.displacement_scale = applied.displacement_scale;
        floor.displacement_bias = applied.displacement_bias;
        tracing::debug!(
            "floor displacement scale={} bias={}",
            applied.displacement_scale,
            applied.displacement_bias
        );
        Ok(applied)
    }
}

/// Camera position as edited in the debug panel.
///
/// Orbit controls re-read the camera each update, so an applied edit
/// becomes the new orbit position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTweaks {
    pub position: Vec3,
}

impl CameraTweaks {
    pub fn read(camera: &PerspectiveCamera) -> Self {
        Self {
            position: camera.position,
        }
    }

    pub fn apply(&self, camera: &mut PerspectiveCamera) -> Vec3 {
        let p = self.position;
        camera.position = Vec3::new(
            CAMERA_AXIS.apply(p.x),
            CAMERA_AXIS.apply(p.y),
            CAMERA_AXIS.apply(p.z),
        );
        camera.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunt_assets::StandardMaterial;

    #[test]
    fn ranges_clamp_and_snap() {
        assert_eq!(FLOOR_DISPLACEMENT_SCALE.apply(5.0), 1.0);
        assert_eq!(FLOOR_DISPLACEMENT_SCALE.apply(0.0), 0.1);
        assert!((FLOOR_DISPLACEMENT_SCALE.apply(0.3042) - 0.3).abs() < 1e-5);
        assert_eq!(FLOOR_DISPLACEMENT_BIAS.apply(-3.0), -2.0);
        assert!((CAMERA_AXIS.apply(4.996) - 5.0).abs() < 1e-4);
        assert!(CAMERA_AXIS.contains(-10.0));
        assert!(!CAMERA_AXIS.contains(10.5));
    }

    #[test]
    fn floor_defaults_sit_inside_their_ranges() {
        assert!(FLOOR_DISPLACEMENT_SCALE.contains(0.3));
        assert!(FLOOR_DISPLACEMENT_BIAS.contains(-0.2));
    }

    #[test]
    fn floor_tweaks_write_the_material() {
        let mut scene = Scene::default();
        let floor = scene.assets.add_material(StandardMaterial {
            displacement_scale: 0.3,
            displacement_bias: -0.2,
            ..StandardMaterial::named("floor")
        });
        let read = FloorTweaks::read(&scene, floor).unwrap();
        assert_eq!(read.displacement_scale, 0.3);

        let applied = FloorTweaks {
            displacement_scale: 2.0,
            displacement_bias: -0.5,
        }
        .apply(&mut scene, floor)
        .unwrap();
        assert_eq!(applied.displacement_scale, 1.0);
        let material = scene.assets.material(floor).unwrap();
        assert_eq!(material.displacement_scale, 1.0);
        assert!((material.displacement_bias + 0.5).abs() < 1e-5);
    }

    #[test]
    fn floor_tweaks_on_missing_material() {
        let mut scene = Scene::default();
        let err = FloorTweaks {
            displacement_scale: 0.3,
            displacement_bias: -0.2,
        }
        .apply(&mut scene, MaterialHandle(99))
        .unwrap_err();
        assert_eq!(err, ToolsError::MaterialNotFound(99));
    }

    #[test]
    fn camera_tweaks_clamp_each_axis() {
        let mut camera = PerspectiveCamera::default();
        let mut tweaks = CameraTweaks::read(&camera);
        assert_eq!(tweaks.position, Vec3::new(5.0, 3.0, 8.0));
        tweaks.position.x = 14.0;
        let applied = tweaks.apply(&mut camera);
        assert_eq!(applied.x, 10.0);
        assert_eq!(camera.position.x, 10.0);
        assert!((camera.position.z - 8.0).abs() < 1e-4);
    }
}
