//! Lazy GPU caches for meshes, materials, textures and samplers.

use bytemuck::{Pod, Zeroable};
use haunt_assets::{
    AssetStore, ColorSpace, Geometry, MaterialHandle, MeshHandle, StandardMaterial, Texture,
    TextureData, TextureId, WrapMode,
};
use std::collections::{BTreeSet, HashMap};
use wgpu::util::DeviceExt;

/// Texture slots per material, in binding order.
pub(crate) const TEXTURE_SLOTS: usize = 7;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuVertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

impl From<&haunt_assets::Vertex> for GpuVertex {
    fn from(v: &haunt_assets::Vertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            uv: v.uv,
        }
    }
}

pub(crate) struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, geometry: &Geometry) -> Self {
        let vertices: Vec<GpuVertex> = geometry.vertices.iter().map(GpuVertex::from).collect();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }
}

/// Material constants as laid out in the scene shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct MaterialUniforms {
    /// rgb: base colour, a: opacity.
    color: [f32; 4],
    /// rgb: emissive colour times intensity.
    emissive: [f32; 4],
    /// roughness, metalness, displacement scale, displacement bias.
    params: [f32; 4],
    /// 1 where colour, ambient occlusion, roughness, metalness maps are bound.
    maps_a: [f32; 4],
    /// 1 where normal, alpha, displacement maps are bound.
    maps_b: [f32; 4],
    /// Two rows per slot.
    uv_rows: [[f32; 4]; TEXTURE_SLOTS * 2],
}

impl MaterialUniforms {
    pub fn new(material: &StandardMaterial, resolved: &[bool; TEXTURE_SLOTS]) -> Self {
        let flag = |i: usize| if resolved[i] { 1.0 } else { 0.0 };
        let [r, g, b] = material.color.to_array();
        let emissive = material.emissive.scaled(material.emissive_intensity).to_array();

        let mut uv_rows = [[0.0; 4]; TEXTURE_SLOTS * 2];
        for (i, slot) in material.maps.slots().iter().enumerate() {
            let [row0, row1] = slot
                .map(|t| t.uv_transform())
                .unwrap_or([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
            uv_rows[i * 2] = [row0[0], row0[1], row0[2], 0.0];
            uv_rows[i * 2 + 1] = [row1[0], row1[1], row1[2], 0.0];
        }

        Self {
            color: [r, g, b, material.opacity],
            emissive: [emissive[0], emissive[1], emissive[2], 0.0],
            params: [
                material.roughness,
                material.metalness,
                material.displacement_scale,
                material.displacement_bias,
            ],
            maps_a: [flag(0), flag(1), flag(2), flag(3)],
            maps_b: [flag(4), flag(5), flag(6), 0.0],
            uv_rows,
        }
    }
}

/// Which slots have a decoded texture available.
pub(crate) fn resolve_slots(material: &StandardMaterial, assets: &AssetStore) -> [bool; TEXTURE_SLOTS] {
    material
        .maps
        .slots()
        .map(|slot| slot.is_some_and(|t| assets.has_texture(t.source)))
}

struct GpuMaterial {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    resolved: [bool; TEXTURE_SLOTS],
}

type SamplerKey = (WrapMode, WrapMode);

fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
    }
}

pub(crate) struct GpuResources {
    material_layout: wgpu::BindGroupLayout,
    meshes: HashMap<MeshHandle, GpuMesh>,
    materials: HashMap<MaterialHandle, GpuMaterial>,
    textures: HashMap<(TextureId, ColorSpace), wgpu::TextureView>,
    samplers: HashMap<SamplerKey, wgpu::Sampler>,
    fallback_texture: wgpu::TextureView,
    texture_generation: Option<u64>,
}

impl GpuResources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        for i in 0..TEXTURE_SLOTS as u32 {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + i,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + TEXTURE_SLOTS as u32 + i,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &entries,
        });

        let fallback_texture = upload_texture(
            device,
            queue,
            "fallback_texture",
            &TextureData::solid([255, 255, 255, 255]),
            ColorSpace::Linear,
        );

        let mut resources = Self {
            material_layout,
            meshes: HashMap::new(),
            materials: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            fallback_texture,
            texture_generation: None,
        };
        resources.ensure_sampler(device, (WrapMode::ClampToEdge, WrapMode::ClampToEdge));
        resources
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&GpuMesh> {
        self.meshes.get(&handle)
    }

    pub fn material_bind_group(&self, handle: MaterialHandle) -> Option<&wgpu::BindGroup> {
        self.materials.get(&handle).map(|m| &m.bind_group)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Upload whatever the given meshes and materials need and refresh
    /// material constants.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetStore,
        meshes: &BTreeSet<MeshHandle>,
        materials: &BTreeSet<MaterialHandle>,
    ) {
        for handle in meshes {
            if self.meshes.contains_key(handle) {
                continue;
            }
            let Some(geometry) = assets.mesh(*handle) else {
                tracing::warn!("mesh {} missing from asset store", handle.0);
                continue;
            };
            let label = format!("mesh_{}", handle.0);
            self.meshes
                .insert(*handle, GpuMesh::upload(device, &label, geometry));
            tracing::debug!(
                "uploaded mesh {} ({} vertices)",
                handle.0,
                geometry.vertex_count()
            );
        }

        let generation = assets.texture_generation();
        let textures_changed = self.texture_generation != Some(generation);
        for handle in materials {
            let Some(material) = assets.material(*handle) else {
                tracing::warn!("material {} missing from asset store", handle.0);
                continue;
            };
            let cached = self.materials.get(handle);
            let resolved = match cached {
                Some(gpu) if !textures_changed => gpu.resolved,
                _ => resolve_slots(material, assets),
            };
            let uniforms = MaterialUniforms::new(material, &resolved);
            if let Some(gpu) = cached.filter(|gpu| gpu.resolved == resolved) {
                queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
                continue;
            }
            let gpu = self.build_material(device, queue, assets, material, resolved, &uniforms);
            self.materials.insert(*handle, gpu);
        }
        self.texture_generation = Some(generation);
    }

    fn build_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetStore,
        material: &StandardMaterial,
        resolved: [bool; TEXTURE_SLOTS],
        uniforms: &MaterialUniforms,
    ) -> GpuMaterial {
        let slots = material.maps.slots();
        for texture in slots.iter().flatten() {
            self.ensure_texture(device, queue, assets, texture);
            self.ensure_sampler(device, (texture.wrap_s, texture.wrap_t));
        }

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&material.name),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let clamp = (WrapMode::ClampToEdge, WrapMode::ClampToEdge);
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }];
        for (i, slot) in slots.iter().enumerate() {
            let bound = slot.filter(|_| resolved[i]);
            let view = bound
                .and_then(|t| self.textures.get(&(t.source, t.color_space)))
                .unwrap_or(&self.fallback_texture);
            let key = bound.map(|t| (t.wrap_s, t.wrap_t)).unwrap_or(clamp);
            let Some(sampler) = self.samplers.get(&key).or_else(|| self.samplers.get(&clamp))
            else {
                continue;
            };
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + (TEXTURE_SLOTS + i) as u32,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&material.name),
            layout: &self.material_layout,
            entries: &entries,
        });
        tracing::debug!(
            "bound material {} ({}/{} maps ready)",
            material.name,
            resolved.iter().filter(|r| **r).count(),
            slots.iter().flatten().count()
        );

        GpuMaterial {
            uniform_buffer,
            bind_group,
            resolved,
        }
    }

    fn ensure_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetStore,
        texture: &Texture,
    ) {
        let key = (texture.source, texture.color_space);
        if self.textures.contains_key(&key) {
            return;
        }
        if let Some(data) = assets.texture(texture.source) {
            let label = format!("texture_{:016x}", texture.source.0);
            let view = upload_texture(device, queue, &label, data, texture.color_space);
            self.textures.insert(key, view);
        }
    }

    fn ensure_sampler(&mut self, device: &wgpu::Device, key: SamplerKey) {
        self.samplers.entry(key).or_insert_with(|| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("material_sampler"),
                address_mode_u: address_mode(key.0),
                address_mode_v: address_mode(key.1),
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            })
        });
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    data: &TextureData,
    color_space: ColorSpace,
) -> wgpu::TextureView {
    let format = match color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    };
    let levels = data.mip_chain();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: data.width.max(1),
            height: data.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: levels.len() as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (level, mip) in levels.iter().enumerate() {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: level as u32,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &mip.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * mip.width),
                rows_per_image: Some(mip.height),
            },
            wgpu::Extent3d {
                width: mip.width,
                height: mip.height,
                depth_or_array_layers: 1,
            },
        );
    }
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunt_assets::MaterialMaps;
    use std::f32::consts::FRAC_PI_2;

    fn roof() -> StandardMaterial {
        let source = TextureId::from_path("roof/arm.webp");
        let arm = Texture::new(source).tiled(3.0, 1.0).rotated(FRAC_PI_2);
        StandardMaterial::named("roof").with_maps(MaterialMaps::default().with_arm(arm))
    }

    #[test]
    fn unresolved_maps_are_flagged_off() {
        let uniforms = MaterialUniforms::new(&roof(), &[false; TEXTURE_SLOTS]);
        assert_eq!(uniforms.maps_a, [0.0; 4]);
        assert_eq!(uniforms.maps_b, [0.0; 4]);
    }

    #[test]
    fn slots_resolve_once_pixels_arrive() {
        let material = roof();
        let mut assets = AssetStore::new();
        assert_eq!(resolve_slots(&material, &assets), [false; TEXTURE_SLOTS]);

        assets.insert_texture(
            TextureId::from_path("roof/arm.webp"),
            TextureData::solid([255, 128, 0, 255]),
        );
        let resolved = resolve_slots(&material, &assets);
        assert_eq!(
            resolved,
            [false, true, true, true, false, false, false]
        );
        let uniforms = MaterialUniforms::new(&material, &resolved);
        assert_eq!(uniforms.maps_a, [0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn uv_rows_carry_repeat_and_rotation() {
        let uniforms = MaterialUniforms::new(&roof(), &[false; TEXTURE_SLOTS]);
        // Colour slot has no map: identity.
        assert_eq!(uniforms.uv_rows[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniforms.uv_rows[1], [0.0, 1.0, 0.0, 0.0]);
        // Ambient occlusion slot: rotated a quarter turn, then tiled 3x1.
        let row0 = uniforms.uv_rows[2];
        let row1 = uniforms.uv_rows[3];
        assert!(row0[0].abs() < 1e-6 && (row0[1] - 3.0).abs() < 1e-6);
        assert!((row1[0] + 1.0).abs() < 1e-6 && row1[1].abs() < 1e-6);
    }

    #[test]
    fn emissive_is_premultiplied_by_intensity() {
        let material = StandardMaterial {
            emissive: haunt_common::Color::rgb(0.0, 1.0, 1.0),
            emissive_intensity: 2.0,
            opacity: 0.1,
            ..StandardMaterial::named("ghost")
        };
        let uniforms = MaterialUniforms::new(&material, &[false; TEXTURE_SLOTS]);
        assert_eq!(uniforms.emissive, [0.0, 2.0, 2.0, 0.0]);
        assert_eq!(uniforms.color[3], 0.1);
        assert_eq!(std::mem::size_of::<MaterialUniforms>() % 16, 0);
    }
}
