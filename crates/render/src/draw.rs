//! Per-frame draw list extraction.
//!
//! Flattens the scene graph into what a backend needs: instanced opaque
//! batches, sorted blended draws, resolved lights and the shadow view.

use crate::camera::PerspectiveCamera;
use crate::sky::SkyUniforms;
use glam::{Mat4, Vec3};
use haunt_assets::{MaterialHandle, MeshHandle};
use haunt_kernel::{Fog, Light, NodeKind, Scene, ShadowConfig};

/// Most directional lights a frame carries.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 2;
/// Most point lights a frame carries.
pub const MAX_POINT_LIGHTS: usize = 4;

/// One mesh instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawInstance {
    pub model: Mat4,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Instances sharing a mesh and material, drawn with one call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub instances: Vec<DrawInstance>,
}

/// A blended draw, ordered by view depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendedDraw {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub instance: DrawInstance,
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLightData {
    /// Unit vector from the surface toward the light.
    pub direction: Vec3,
    pub radiance: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightData {
    pub position: Vec3,
    pub radiance: Vec3,
    pub distance: f32,
    pub decay: f32,
}

/// Lights resolved to world space, with colour times intensity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightSet {
    pub ambient: Vec3,
    pub directional: Vec<DirectionalLightData>,
    pub point: Vec<PointLightData>,
}

/// Shadow-casting light's view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowView {
    pub view_projection: Mat4,
    pub config: ShadowConfig,
    /// Index into `LightSet::directional`.
    pub light_index: usize,
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    pub view: Mat4,
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    pub opaque: Vec<DrawBatch>,
    pub blended: Vec<BlendedDraw>,
    pub lights: LightSet,
    pub shadow: Option<ShadowView>,
    pub fog: Fog,
    pub sky: SkyUniforms,
}

impl FrameData {
    pub fn draw_count(&self) -> usize {
        self.opaque.len() + self.blended.len()
    }

    pub fn instance_count(&self) -> usize {
        self.opaque.iter().map(|b| b.instances.len()).sum::<usize>() + self.blended.len()
    }

    /// Instances that write into the shadow map, in draw order.
    pub fn shadow_casters(&self) -> impl Iterator<Item = (MeshHandle, &DrawInstance)> {
        let opaque = self
            .opaque
            .iter()
            .flat_map(|b| b.instances.iter().map(move |i| (b.mesh, i)));
        let blended = self.blended.iter().map(|d| (d.mesh, &d.instance));
        opaque.chain(blended).filter(|(_, i)| i.cast_shadow)
    }
}

/// Walk the scene and build the frame's draw list.
pub fn extract_frame(scene: &Scene, camera: &PerspectiveCamera) -> FrameData {
    let mut opaque: Vec<DrawBatch> = Vec::new();
    let mut blended: Vec<BlendedDraw> = Vec::new();
    let mut lights = LightSet::default();
    let mut shadow = None;
    let (mut dropped_directional, mut dropped_point) = (0usize, 0usize);

    scene.graph.traverse_visible(|_, node, world| match node.kind {
        NodeKind::Mesh(mesh) => {
            let instance = DrawInstance {
                model: world,
                cast_shadow: mesh.cast_shadow,
                receive_shadow: mesh.receive_shadow,
            };
            let is_blended = scene
                .assets
                .material(mesh.material)
                .is_some_and(|m| m.is_blended());
            if is_blended {
                blended.push(BlendedDraw {
                    mesh: mesh.mesh,
                    material: mesh.material,
                    instance,
                    depth: camera.view_depth(world.w_axis.truncate()),
                });
            } else if let Some(batch) = opaque
                .iter_mut()
                .find(|b| b.mesh == mesh.mesh && b.material == mesh.material)
            {
                batch.instances.push(instance);
            } else {
                opaque.push(DrawBatch {
                    mesh: mesh.mesh,
                    material: mesh.material,
                    instances: vec![instance],
                });
            }
        }
        NodeKind::Light(light) => {
            let position = world.w_axis.truncate();
            let radiance = Vec3::from(light.color().to_array()) * light.intensity();
            match light {
                Light::Ambient(_) => lights.ambient += radiance,
                Light::Directional(d) => {
                    if lights.directional.len() >= MAX_DIRECTIONAL_LIGHTS {
                        dropped_directional += 1;
                        return;
                    }
                    if shadow.is_none() {
                        if let Some(view_projection) = d.light_view_projection(position) {
                            shadow = d.shadow.map(|config| ShadowView {
                                view_projection,
                                config,
                                light_index: lights.directional.len(),
                            });
                        }
                    }
                    lights.directional.push(DirectionalLightData {
                        direction: -d.direction(position),
                        radiance,
                    });
                }
                Light::Point(p) => {
                    if lights.point.len() >= MAX_POINT_LIGHTS {
                        dropped_point += 1;
                        return;
                    }
                    lights.point.push(PointLightData {
                        position,
                        radiance,
                        distance: p.distance,
                        decay: p.decay,
                    });
                }
            }
        }
        NodeKind::Group => {}
    });

    if dropped_directional + dropped_point > 0 {
        tracing::debug!(
            "light limit reached: dropped {dropped_directional} directional (max {MAX_DIRECTIONAL_LIGHTS}), \
             {dropped_point} point (max {MAX_POINT_LIGHTS})"
        );
    }

    // Far to near.
    blended.sort_by(|a, b| b.depth.total_cmp(&a.depth));

    FrameData {
        view: camera.view_matrix(),
        view_projection: camera.view_projection(),
        camera_position: camera.position,
        opaque,
        blended,
        lights,
        shadow,
        fog: scene.environment.fog,
        sky: SkyUniforms::from_params(&scene.environment.sky),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunt_assets::{Geometry, StandardMaterial};
    use haunt_common::{Color, Transform};
    use haunt_kernel::{AmbientLight, DirectionalLight, MeshNode, PointLight};

    fn add_blended(scene: &mut Scene, name: &str, position: Vec3) {
        scene
            .add_mesh(
                None,
                name,
                Transform::from_position(position),
                Geometry::plane(1.0, 1.0, 1, 1),
                StandardMaterial {
                    transparent: true,
                    ..StandardMaterial::named(name)
                },
            )
            .unwrap();
    }

    #[test]
    fn shared_mesh_and_material_batch_together() {
        let mut scene = Scene::default();
        let mesh = MeshNode::new(
            scene.assets.add_mesh(Geometry::cuboid(0.6, 0.8, 0.2)),
            scene.assets.add_material(StandardMaterial::named("grave")),
        )
        .with_shadows(true, true);
        for i in 0..30 {
            scene
                .graph
                .add(
                    None,
                    format!("grave{i}"),
                    Transform::from_position(Vec3::X * i as f32),
                    NodeKind::Mesh(mesh),
                )
                .unwrap();
        }
        let frame = extract_frame(&scene, &PerspectiveCamera::default());
        assert_eq!(frame.opaque.len(), 1);
        assert_eq!(frame.opaque[0].instances.len(), 30);
        assert_eq!(frame.instance_count(), 30);
        assert_eq!(frame.shadow_casters().count(), 30);
    }

    #[test]
    fn blended_draws_sort_far_to_near() {
        let mut scene = Scene::default();
        add_blended(&mut scene, "near", Vec3::new(4.0, 2.0, 6.0));
        add_blended(&mut scene, "far", Vec3::new(-4.0, 0.0, -6.0));
        add_blended(&mut scene, "middle", Vec3::ZERO);

        let frame = extract_frame(&scene, &PerspectiveCamera::default());
        assert!(frame.opaque.is_empty());
        let depths: Vec<f32> = frame.blended.iter().map(|d| d.depth).collect();
        assert!(depths.windows(2).all(|w| w[0] >= w[1]), "{depths:?}");
    }

    #[test]
    fn lights_resolve_and_shadow_view_is_found() {
        let mut scene = Scene::default();
        let moon = Color::from_hex("#86cdff").unwrap();
        scene
            .add_light(
                None,
                "ambient",
                Vec3::ZERO,
                Light::Ambient(AmbientLight {
                    color: moon,
                    intensity: 0.3,
                }),
            )
            .unwrap();
        scene
            .add_light(
                None,
                "moon",
                Vec3::new(3.0, 2.0, -8.0),
                Light::Directional(DirectionalLight {
                    color: moon,
                    intensity: 1.0,
                    target: Vec3::ZERO,
                    shadow: Some(ShadowConfig::default()),
                }),
            )
            .unwrap();
        scene
            .add_light(
                None,
                "door",
                Vec3::new(0.0, 2.2, 2.7),
                Light::Point(PointLight::new(Color::WHITE, 0.4)),
            )
            .unwrap();

        let frame = extract_frame(&scene, &PerspectiveCamera::default());
        assert!((frame.lights.ambient - Vec3::from(moon.to_array()) * 0.3).length() < 1e-6);
        assert_eq!(frame.lights.directional.len(), 1);
        let toward_light = frame.lights.directional[0].direction;
        assert!((toward_light - Vec3::new(3.0, 2.0, -8.0).normalize()).length() < 1e-5);
        assert_eq!(frame.lights.point.len(), 1);
        assert_eq!(frame.lights.point[0].decay, 2.0);
        let shadow = frame.shadow.unwrap();
        assert_eq!(shadow.light_index, 0);
        assert_eq!(shadow.config.map_size, 256);
    }

    #[test]
    fn lights_past_the_limit_are_dropped_in_graph_order() {
        let mut scene = Scene::default();
        for i in 0..MAX_POINT_LIGHTS + 2 {
            scene
                .add_light(
                    None,
                    format!("lamp{i}"),
                    Vec3::X * i as f32,
                    Light::Point(PointLight::new(Color::WHITE, 1.0)),
                )
                .unwrap();
        }
        for i in 0..MAX_DIRECTIONAL_LIGHTS + 1 {
            scene
                .add_light(
                    None,
                    format!("sun{i}"),
                    Vec3::new(1.0, 4.0, i as f32),
                    Light::Directional(DirectionalLight {
                        color: Color::WHITE,
                        intensity: 1.0,
                        target: Vec3::ZERO,
                        shadow: None,
                    }),
                )
                .unwrap();
        }

        let frame = extract_frame(&scene, &PerspectiveCamera::default());
        assert_eq!(frame.lights.point.len(), MAX_POINT_LIGHTS);
        assert_eq!(frame.lights.directional.len(), MAX_DIRECTIONAL_LIGHTS);
        let last = frame.lights.point.last().unwrap();
        assert_eq!(last.position, Vec3::X * (MAX_POINT_LIGHTS - 1) as f32);
    }

    #[test]
    fn hidden_subtrees_are_skipped() {
        let mut scene = Scene::default();
        let (id, _) = scene
            .add_mesh(
                None,
                "tree",
                Transform::default(),
                Geometry::cuboid(1.0, 1.0, 1.0),
                StandardMaterial::named("bark"),
            )
            .unwrap();
        scene.graph.get_mut(id).unwrap().visible = false;
        let frame = extract_frame(&scene, &PerspectiveCamera::default());
        assert_eq!(frame.draw_count(), 0);
    }
}
