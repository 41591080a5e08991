//! Frame clock and the per-frame ghost animation.

use crate::scene::Scene;
use glam::Vec3;
use haunt_common::NodeId;
use std::time::{Duration, Instant};

/// Ghost orbit radius around the house.
pub const GHOST_ORBIT_RADIUS: f32 = 7.0;

/// Ghost position at elapsed time `t` seconds.
pub fn ghost_position(t: f64) -> Vec3 {
    let angle = t / 4.0;
    Vec3::new(
        (angle.sin() * GHOST_ORBIT_RADIUS as f64) as f32,
        ((2.0 * t).sin() * 0.1 + 0.25) as f32,
        (angle.cos() * GHOST_ORBIT_RADIUS as f64) as f32,
    )
}

/// Ghost material opacity at elapsed time `t` seconds.
pub fn ghost_opacity(t: f64) -> f32 {
    (t.sin() * 0.1 + 0.1) as f32
}

/// Elapsed time since start and the delta of the last update.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    delta: Duration,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            last: start,
            delta: Duration::ZERO,
        }
    }

    /// Advance to `now`. Instants earlier than the last update count as zero delta.
    pub fn update(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last);
        if now > self.last {
            self.last = now;
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.last.duration_since(self.start).as_secs_f64()
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

/// Outcome of one frame-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub frame: u64,
    pub elapsed: f64,
    pub delta: Duration,
    pub ghost_animated: bool,
}

/// Drives time-based animation of the scene.
///
/// Owns the clock and the ghost reference. The ghost is set when its model
/// arrives; until then ticks only advance time.
#[derive(Debug, Default)]
pub struct FrameLoop {
    clock: FrameClock,
    ghost: Option<NodeId>,
    frames: u64,
}

impl FrameLoop {
    pub fn new(start: Instant) -> Self {
        Self {
            clock: FrameClock::new(start),
            ghost: None,
            frames: 0,
        }
    }

    pub fn set_ghost(&mut self, ghost: NodeId) {
        tracing::info!("ghost attached ({})", ghost.short());
        self.ghost = Some(ghost);
    }

    pub fn ghost(&self) -> Option<NodeId> {
        self.ghost
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Advance the clock to `now` and animate the scene.
    pub fn tick(&mut self, scene: &mut Scene, now: Instant, camera_position: Vec3) -> FrameTick {
        self.clock.update(now);
        self.frames += 1;
        let elapsed = self.clock.elapsed();
        let ghost_animated = self.animate(scene, elapsed, camera_position);
        FrameTick {
            frame: self.frames,
            elapsed,
            delta: self.clock.delta(),
            ghost_animated,
        }
    }

    /// Place the ghost for time `t`. Returns false when there is no ghost
    /// or it has left the graph.
    pub fn animate(&self, scene: &mut Scene, t: f64, camera_position: Vec3) -> bool {
        let Some(ghost) = self.ghost else {
            return false;
        };
        let Some(node) = scene.graph.get_mut(ghost) else {
            return false;
        };
        node.transform.position = ghost_position(t);

        let opacity = ghost_opacity(t);
        scene.update_materials_under(ghost, |m| m.opacity = opacity);

        scene.graph.look_at(ghost, camera_position).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunt_assets::{Geometry, StandardMaterial};
    use haunt_common::Transform;
    use std::f64::consts::FRAC_PI_2;

    fn scene_with_ghost() -> (Scene, NodeId) {
        let mut scene = Scene::default();
        let ghost = scene
            .graph
            .add_group(None, "ghost", Transform::default())
            .unwrap();
        scene
            .add_mesh(
                Some(ghost),
                "sheet",
                Transform::default(),
                Geometry::sphere(1.0, 8, 8),
                StandardMaterial::named("sheet"),
            )
            .unwrap();
        (scene, ghost)
    }

    #[test]
    fn ghost_starts_in_front_of_house() {
        let p = ghost_position(0.0);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 0.25).abs() < 1e-6);
        assert!((p.z - 7.0).abs() < 1e-6);
    }

    #[test]
    fn ghost_opacity_pulses() {
        assert!((ghost_opacity(0.0) - 0.1).abs() < 1e-6);
        assert!((ghost_opacity(FRAC_PI_2) - 0.2).abs() < 1e-6);
        assert!(ghost_opacity(3.0 * FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn ghost_stays_on_orbit() {
        for i in 0..50 {
            let p = ghost_position(i as f64 * 0.7);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!((r - GHOST_ORBIT_RADIUS).abs() < 1e-4);
            assert!(p.y >= 0.15 - 1e-6 && p.y <= 0.35 + 1e-6);
        }
    }

    #[test]
    fn clock_tracks_elapsed_and_delta() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        clock.update(start + Duration::from_millis(16));
        clock.update(start + Duration::from_millis(50));
        assert!((clock.elapsed() - 0.05).abs() < 1e-9);
        assert_eq!(clock.delta(), Duration::from_millis(34));

        // Time never runs backwards.
        clock.update(start);
        assert_eq!(clock.delta(), Duration::ZERO);
        assert!((clock.elapsed() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn tick_without_ghost_only_advances_time() {
        let start = Instant::now();
        let mut frame_loop = FrameLoop::new(start);
        let mut scene = Scene::default();
        let tick = frame_loop.tick(&mut scene, start + Duration::from_secs(1), Vec3::ONE);
        assert_eq!(tick.frame, 1);
        assert!(!tick.ghost_animated);
        assert!((tick.elapsed - 1.0).abs() < 1e-9);
        assert!(scene.graph.is_empty());
    }

    #[test]
    fn tick_moves_and_fades_ghost() {
        let start = Instant::now();
        let (mut scene, ghost) = scene_with_ghost();
        let mut frame_loop = FrameLoop::new(start);
        frame_loop.set_ghost(ghost);

        let camera = Vec3::new(5.0, 3.0, 8.0);
        let tick = frame_loop.tick(&mut scene, start, camera);
        assert!(tick.ghost_animated);

        let node = scene.graph.get(ghost).unwrap();
        assert!((node.transform.position - Vec3::new(0.0, 0.25, 7.0)).length() < 1e-5);
        let facing = node.transform.rotation * Vec3::Z;
        let expected = (camera - node.transform.position).normalize();
        assert!((facing - expected).length() < 1e-4);

        for handle in scene.materials_under(ghost) {
            let opacity = scene.assets.material(handle).unwrap().opacity;
            assert!((opacity - 0.1).abs() < 1e-6);
        }
    }

    #[test]
    fn removed_ghost_is_ignored() {
        let (mut scene, ghost) = scene_with_ghost();
        let mut frame_loop = FrameLoop::default();
        frame_loop.set_ghost(ghost);
        scene.graph.remove(ghost).unwrap();
        assert!(!frame_loop.animate(&mut scene, 1.0, Vec3::ONE));
    }
}
