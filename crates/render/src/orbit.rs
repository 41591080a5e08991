use crate::camera::PerspectiveCamera;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;

/// Orbit camera controls: rotate about a target on a sphere.
///
/// Zoom and pan are not supported. Each `update` re-reads the camera
/// position, so external edits to the camera are kept and orbiting resumes
/// from wherever the camera now is.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub rotate_speed: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    delta_theta: f32,
    delta_phi: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            rotate_speed: 1.0,
            enable_damping: true,
            damping_factor: 0.05,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_polar_range(mut self, min: f32, max: f32) -> Self {
        self.min_polar_angle = min;
        self.max_polar_angle = max;
        self
    }

    pub fn with_damping(mut self, enabled: bool, factor: f32) -> Self {
        self.enable_damping = enabled;
        self.damping_factor = factor;
        self
    }

    /// Queue rotation for a pointer drag of `delta` pixels.
    ///
    /// A drag across the full viewport height turns a full circle.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.delta_theta -= TAU * delta.x / height * self.rotate_speed;
        self.delta_phi -= TAU * delta.y / height * self.rotate_speed;
    }

    /// Whether queued rotation remains to be applied.
    pub fn is_moving(&self) -> bool {
        self.delta_theta.abs() > EPS || self.delta_phi.abs() > EPS
    }

    /// Apply queued rotation to the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius < EPS {
            camera.look_at(self.target);
            return false;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * step;
        phi += self.delta_phi * step;

        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        let sin_phi = phi.sin();
        let new_offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );

        let previous = camera.position;
        camera.position = self.target + new_offset;
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }

        (camera.position - previous).length_squared() > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn controls() -> OrbitControls {
        OrbitControls::new(Vec3::ZERO).with_polar_range(0.0, FRAC_PI_2)
    }

    #[test]
    fn idle_update_keeps_camera() {
        let mut camera = PerspectiveCamera::default();
        let mut orbit = controls();
        assert!(!orbit.update(&mut camera));
        assert!((camera.position - Vec3::new(5.0, 3.0, 8.0)).length() < 1e-4);
    }

    #[test]
    fn external_camera_edits_survive_update() {
        let mut camera = PerspectiveCamera::default();
        let mut orbit = controls();
        camera.position = Vec3::new(-2.0, 6.0, 4.0);
        orbit.update(&mut camera);
        assert!((camera.position - Vec3::new(-2.0, 6.0, 4.0)).length() < 1e-4);
    }

    #[test]
    fn rotation_preserves_radius() {
        let mut camera = PerspectiveCamera::default();
        let radius = camera.position.length();
        let mut orbit = controls().with_damping(false, 0.05);
        orbit.rotate(Vec2::new(120.0, 0.0), 600.0);
        assert!(orbit.update(&mut camera));
        assert!((camera.position.length() - radius).abs() < 1e-4);
        assert!((camera.position.y - 3.0).abs() < 1e-4);
        assert!(!orbit.is_moving());
    }

    #[test]
    fn polar_angle_clamps_at_horizon() {
        let mut camera = PerspectiveCamera::default();
        let mut orbit = controls().with_damping(false, 0.05);
        // Dragging up pushes the camera down toward and past the horizon.
        orbit.rotate(Vec2::new(0.0, -2000.0), 600.0);
        orbit.update(&mut camera);
        assert!(camera.position.y >= -1e-4);
        assert!(camera.position.y < 1e-3);
    }

    #[test]
    fn polar_angle_clamps_at_zenith() {
        let mut camera = PerspectiveCamera::default();
        let radius = camera.position.length();
        let mut orbit = controls().with_damping(false, 0.05);
        orbit.rotate(Vec2::new(0.0, 2000.0), 600.0);
        orbit.update(&mut camera);
        assert!((camera.position.y - radius).abs() < 1e-3);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn damping_eases_out() {
        let mut camera = PerspectiveCamera::default();
        let mut orbit = controls();
        orbit.rotate(Vec2::new(60.0, 0.0), 600.0);

        let start = camera.position;
        orbit.update(&mut camera);
        let first_step = (camera.position - start).length();
        assert!(orbit.is_moving());

        let before = camera.position;
        orbit.update(&mut camera);
        let second_step = (camera.position - before).length();
        assert!(second_step < first_step);

        for _ in 0..1000 {
            orbit.update(&mut camera);
        }
        assert!(!orbit.is_moving());
    }
}
