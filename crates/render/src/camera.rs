use glam::{Mat4, Vec3};
use haunt_common::Viewport;

/// Perspective camera looking from `position` at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(5.0, 3.0, 8.0),
            target: Vec3::ZERO,
            fov: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            ..Self::default()
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Match the aspect ratio of a resized viewport.
    pub fn apply_viewport(&mut self, viewport: &Viewport) {
        self.set_aspect(viewport.aspect());
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let up = if self.forward().cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance along the view direction, used to order blended draws.
    pub fn view_depth(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.forward())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = PerspectiveCamera::default();
        let clip = camera.view_projection().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut camera = PerspectiveCamera::default();
        camera.apply_viewport(&Viewport::new(800, 600, 1.0));
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        camera.set_aspect(f32::NAN);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn straight_down_view_is_finite() {
        let camera = PerspectiveCamera {
            position: Vec3::new(0.0, 10.0, 0.0),
            ..PerspectiveCamera::default()
        };
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn depth_increases_away_from_camera() {
        let camera = PerspectiveCamera::default();
        assert!(camera.view_depth(Vec3::ZERO) < camera.view_depth(Vec3::new(-5.0, -3.0, -8.0)));
    }
}
