use crate::config::{ConfigError, GraveConfig};
use glam::Vec3;
use haunt_common::Transform;
use rand::Rng;
use std::f32::consts::TAU;

/// One randomly placed grave.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GravePlacement {
    pub angle: f32,
    pub radius: f32,
    pub position: Vec3,
    /// Euler angles, applied in X, Y, Z order.
    pub rotation: Vec3,
}

impl GravePlacement {
    pub fn transform(&self) -> Transform {
        Transform::from_position(self.position).with_euler(
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }
}

/// Scatter graves on a ring around the house.
///
/// Angle is uniform in [0, 2π) and radius uniform in `[min_radius,
/// max_radius)`. Each axis of rotation is uniform in `[-tilt, tilt)`.
/// An invalid config is rejected before any sampling.
pub fn place_graves<R: Rng>(
    config: &GraveConfig,
    rng: &mut R,
) -> Result<Vec<GravePlacement>, ConfigError> {
    config.validate()?;
    let graves = (0..config.count)
        .map(|_| {
            let angle = rng.random_range(0.0..TAU);
            let radius = rng.random_range(config.min_radius..config.max_radius);
            let position = Vec3::new(angle.cos() * radius, config.y, angle.sin() * radius);
            // Draw order is y, z, x.
            let y = symmetric(rng, config.tilt.y);
            let z = symmetric(rng, config.tilt.z);
            let x = symmetric(rng, config.tilt.x);
            GravePlacement {
                angle,
                radius,
                position,
                rotation: Vec3::new(x, y, z),
            }
        })
        .collect();
    Ok(graves)
}

fn symmetric<R: Rng>(rng: &mut R, half: f32) -> f32 {
    if half <= 0.0 {
        return 0.0;
    }
    rng.random_range(-half..half)
}
