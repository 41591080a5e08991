//! CPU-side packing of a frame into GPU uniform and instance layouts.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};
use haunt_assets::{MaterialHandle, MeshHandle};
use haunt_render::{DrawInstance, FrameData, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS};
use std::collections::BTreeMap;
use std::ops::Range;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    /// x: receives shadows.
    pub params: [f32; 4],
}

impl InstanceData {
    pub fn new(instance: &DrawInstance) -> Self {
        let normal = normal_matrix(instance.model);
        let [c0, c1, c2] = normal.to_cols_array_2d();
        Self {
            model: instance.model.to_cols_array_2d(),
            normal: [
                [c0[0], c0[1], c0[2], 0.0],
                [c1[0], c1[1], c1[2], 0.0],
                [c2[0], c2[1], c2[2], 0.0],
            ],
            params: [
                if instance.receive_shadow { 1.0 } else { 0.0 },
                0.0,
                0.0,
                0.0,
            ],
        }
    }
}

fn normal_matrix(model: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(model);
    if linear.determinant().abs() < 1e-12 {
        return linear;
    }
    linear.inverse().transpose()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCall {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub instances: Range<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShadowCall {
    pub mesh: MeshHandle,
    pub instances: Range<u32>,
}

/// All instances of a frame in one buffer, with the ranges each pass draws.
#[derive(Debug, Default)]
pub(crate) struct DrawPlan {
    pub instances: Vec<InstanceData>,
    pub opaque: Vec<DrawCall>,
    pub blended: Vec<DrawCall>,
    pub shadow: Vec<ShadowCall>,
}

impl DrawPlan {
    pub fn build(frame: &FrameData) -> Self {
        let mut plan = Self::default();

        for batch in &frame.opaque {
            let start = plan.instances.len() as u32;
            plan.instances
                .extend(batch.instances.iter().map(InstanceData::new));
            plan.opaque.push(DrawCall {
                mesh: batch.mesh,
                material: batch.material,
                instances: start..plan.instances.len() as u32,
            });
        }

        for draw in &frame.blended {
            let start = plan.instances.len() as u32;
            plan.instances.push(InstanceData::new(&draw.instance));
            plan.blended.push(DrawCall {
                mesh: draw.mesh,
                material: draw.material,
                instances: start..start + 1,
            });
        }

        if frame.shadow.is_some() {
            let mut by_mesh: BTreeMap<MeshHandle, Vec<InstanceData>> = BTreeMap::new();
            for (mesh, instance) in frame.shadow_casters() {
                by_mesh
                    .entry(mesh)
                    .or_default()
                    .push(InstanceData::new(instance));
            }
            for (mesh, instances) in by_mesh {
                let start = plan.instances.len() as u32;
                plan.instances.extend(instances);
                plan.shadow.push(ShadowCall {
                    mesh,
                    instances: start..plan.instances.len() as u32,
                });
            }
        }

        plan
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
    /// rgb: fog colour, w: density.
    pub fog: [f32; 4],
    /// xyz: toward the light, w: 1 when shadowed.
    pub directional_direction: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    pub directional_radiance: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// xyz: position, w: cutoff distance.
    pub point_position: [[f32; 4]; MAX_POINT_LIGHTS],
    /// rgb: radiance, w: decay exponent.
    pub point_radiance: [[f32; 4]; MAX_POINT_LIGHTS],
    pub counts: [u32; 4],
    /// x: depth bias, y: texel size, z: 1 when a shadow map is active.
    pub shadow: [f32; 4],
}

impl FrameUniforms {
    pub fn new(frame: &FrameData) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.view_proj = frame.view_projection.to_cols_array_2d();
        uniforms.view = frame.view.to_cols_array_2d();
        uniforms.camera_position = frame.camera_position.extend(1.0).to_array();
        uniforms.ambient = frame.lights.ambient.extend(0.0).to_array();
        uniforms.fog = {
            let [r, g, b] = frame.fog.color.to_array();
            [r, g, b, frame.fog.density]
        };

        let shadowed = frame.shadow.map(|s| s.light_index);
        for (i, light) in frame
            .lights
            .directional
            .iter()
            .take(MAX_DIRECTIONAL_LIGHTS)
            .enumerate()
        {
            let flag = if shadowed == Some(i) { 1.0 } else { 0.0 };
            uniforms.directional_direction[i] = light.direction.extend(flag).to_array();
            uniforms.directional_radiance[i] = light.radiance.extend(0.0).to_array();
        }
        for (i, light) in frame.lights.point.iter().take(MAX_POINT_LIGHTS).enumerate() {
            uniforms.point_position[i] = light.position.extend(light.distance).to_array();
            uniforms.point_radiance[i] = light.radiance.extend(light.decay).to_array();
        }
        uniforms.counts = [
            frame.lights.directional.len().min(MAX_DIRECTIONAL_LIGHTS) as u32,
            frame.lights.point.len().min(MAX_POINT_LIGHTS) as u32,
            0,
            0,
        ];

        if let Some(shadow) = frame.shadow {
            uniforms.light_view_proj = shadow.view_projection.to_cols_array_2d();
            uniforms.shadow = [
                shadow.config.bias,
                1.0 / shadow.config.map_size.max(1) as f32,
                1.0,
                0.0,
            ];
        } else {
            uniforms.light_view_proj = Mat4::IDENTITY.to_cols_array_2d();
        }
        uniforms
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct SkyGpuUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// w: box scale.
    pub camera_position: [f32; 4],
    /// w: sun irradiance.
    pub sun_direction: [f32; 4],
    /// w: sun fade.
    pub beta_r: [f32; 4],
    /// w: Mie directional g.
    pub beta_m: [f32; 4],
}

impl SkyGpuUniforms {
    pub fn new(frame: &FrameData) -> Self {
        let sky = &frame.sky;
        Self {
            view_proj: frame.view_projection.to_cols_array_2d(),
            camera_position: frame.camera_position.extend(sky.scale).to_array(),
            sun_direction: sky.sun_direction.extend(sky.sun_e).to_array(),
            beta_r: sky.beta_r.extend(sky.sun_fade).to_array(),
            beta_m: sky.beta_m.extend(sky.mie_directional_g).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use haunt_assets::{Geometry, StandardMaterial};
    use haunt_common::{Color, Transform};
    use haunt_kernel::{DirectionalLight, Light, MeshNode, NodeKind, Scene, ShadowConfig};
    use haunt_render::{PerspectiveCamera, extract_frame};

    fn graveyard() -> Scene {
        let mut scene = Scene::default();
        let grave = MeshNode::new(
            scene.assets.add_mesh(Geometry::cuboid(0.6, 0.8, 0.2)),
            scene.assets.add_material(StandardMaterial::named("grave")),
        )
        .with_shadows(true, true);
        for i in 0..3 {
            scene
                .graph
                .add(
                    None,
                    format!("grave{i}"),
                    Transform::from_position(Vec3::X * i as f32),
                    NodeKind::Mesh(grave),
                )
                .unwrap();
        }
        scene
            .add_mesh(
                None,
                "ghost",
                Transform::from_position(Vec3::new(0.0, 0.25, 3.0)),
                Geometry::sphere(1.0, 8, 8),
                StandardMaterial {
                    transparent: true,
                    ..StandardMaterial::named("ghost")
                },
            )
            .unwrap();
        scene
            .add_light(
                None,
                "moon",
                Vec3::new(3.0, 2.0, -8.0),
                Light::Directional(DirectionalLight {
                    color: Color::WHITE,
                    intensity: 1.0,
                    target: Vec3::ZERO,
                    shadow: Some(ShadowConfig::default()),
                }),
            )
            .unwrap();
        scene
    }

    #[test]
    fn plan_packs_passes_into_one_buffer() {
        let frame = extract_frame(&graveyard(), &PerspectiveCamera::default());
        let plan = DrawPlan::build(&frame);

        assert_eq!(plan.opaque.len(), 1);
        assert_eq!(plan.opaque[0].instances, 0..3);
        assert_eq!(plan.blended.len(), 1);
        assert_eq!(plan.blended[0].instances, 3..4);
        // Only the graves cast.
        assert_eq!(plan.shadow.len(), 1);
        assert_eq!(plan.shadow[0].instances, 4..7);
        assert_eq!(plan.instances.len(), 7);
    }

    #[test]
    fn no_shadow_light_means_no_shadow_calls() {
        let mut scene = graveyard();
        let moon = *scene.graph.roots().last().unwrap();
        scene.graph.remove(moon).unwrap();
        let plan = DrawPlan::build(&extract_frame(&scene, &PerspectiveCamera::default()));
        assert!(plan.shadow.is_empty());
        assert_eq!(plan.instances.len(), 4);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 1.0),
            Quat::IDENTITY,
            Vec3::ZERO,
        );
        let data = InstanceData::new(&DrawInstance {
            model,
            cast_shadow: false,
            receive_shadow: true,
        });
        assert_eq!(data.normal[0][0], 0.5);
        assert_eq!(data.normal[1][1], 1.0);
        assert_eq!(data.params[0], 1.0);
    }

    #[test]
    fn degenerate_scale_does_not_produce_nan() {
        let data = InstanceData::new(&DrawInstance {
            model: Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)),
            cast_shadow: false,
            receive_shadow: false,
        });
        assert!(data.normal.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn frame_uniforms_flag_the_shadowed_light() {
        let frame = extract_frame(&graveyard(), &PerspectiveCamera::default());
        let uniforms = FrameUniforms::new(&frame);
        assert_eq!(uniforms.counts[0], 1);
        assert_eq!(uniforms.counts[1], 0);
        assert_eq!(uniforms.directional_direction[0][3], 1.0);
        assert_eq!(uniforms.shadow[2], 1.0);
        assert!((uniforms.shadow[1] - 1.0 / 256.0).abs() < 1e-9);
        assert!((uniforms.fog[3] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn uniform_layouts_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<SkyGpuUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<InstanceData>(), 128);
    }
}
