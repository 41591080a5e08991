//! glTF 2.0 model import.
//!
//! Loads `.gltf`/`.glb` files with the `gltf` crate and flattens them into
//! plain data ([`ModelData`]) that can cross a thread boundary. Registration
//! into an [`crate::AssetStore`] happens later on the scene-owning thread.

use crate::AssetError;
use crate::geometry::{Geometry, Vertex};
use crate::material::{MaterialMaps, StandardMaterial};
use crate::texture::{ColorSpace, Texture, TextureData, TextureId, WrapMode};
use glam::{Quat, Vec3};
use haunt_common::{Color, Transform};
use std::path::Path;

/// A triangle primitive with its resolved material.
#[derive(Debug, Clone)]
pub struct ModelPrimitive {
    pub geometry: Geometry,
    pub material: StandardMaterial,
}

/// One node of the imported hierarchy.
#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub primitives: Vec<ModelPrimitive>,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    /// Total primitives in this subtree.
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
            + self
                .children
                .iter()
                .map(ModelNode::primitive_count)
                .sum::<usize>()
    }
}

/// An imported model: root nodes of its default scene plus decoded images.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub name: String,
    pub roots: Vec<ModelNode>,
    pub textures: Vec<(TextureId, TextureData)>,
}

impl ModelData {
    pub fn primitive_count(&self) -> usize {
        self.roots.iter().map(ModelNode::primitive_count).sum()
    }
}

/// Import a glTF or GLB file.
///
/// Primitives that are not triangle lists or lack positions are skipped with
/// a warning. Images in formats other than 8-bit are dropped, leaving the
/// material untextured.
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelData, AssetError> {
    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path)?;
    let key = path.to_string_lossy().replace('\\', "/");

    let image_ids: Vec<TextureId> = (0..images.len())
        .map(|i| TextureId::from_path(&format!("{key}#image{i}")))
        .collect();

    let mut textures = Vec::new();
    for (i, image) in images.into_iter().enumerate() {
        match image_to_rgba(image) {
            Ok(data) => textures.push((image_ids[i], data)),
            Err(e) => tracing::warn!("{}: dropping image {i}: {e}", path.display()),
        }
    }

    let mut roots = Vec::new();
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            roots.push(import_node(&node, &buffers, &image_ids));
        }
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string();
    let model = ModelData {
        name,
        roots,
        textures,
    };
    tracing::debug!(
        "imported {} ({} primitives, {} textures)",
        path.display(),
        model.primitive_count(),
        model.textures.len()
    );
    Ok(model)
}

fn import_node(
    node: &gltf::Node<'_>,
    buffers: &[gltf::buffer::Data],
    image_ids: &[TextureId],
) -> ModelNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform {
        position: Vec3::from(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from(scale),
    };

    let mut primitives = Vec::new();
    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("mesh").to_string();
        for (index, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::warn!("{mesh_name}/{index}: skipping non-triangle primitive");
                continue;
            }
            match import_primitive(&primitive, buffers, &mesh_name, index) {
                Ok(geometry) => primitives.push(ModelPrimitive {
                    geometry,
                    material: import_material(&primitive.material(), image_ids),
                }),
                Err(e) => tracing::warn!("{e}"),
            }
        }
    }

    ModelNode {
        name: node.name().map(str::to_string),
        transform,
        primitives,
        children: node
            .children()
            .map(|child| import_node(&child, buffers, image_ids))
            .collect(),
    }
}

fn import_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    mesh: &str,
    index: usize,
) -> Result<Geometry, AssetError> {
    let reader = primitive.reader(|buffer| Some(&*buffers[buffer.index()]));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| AssetError::MissingPositions {
            mesh: mesh.to_string(),
            primitive: index,
        })?
        .collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => compute_normals(&positions, &indices),
    };
    // glTF uvs have their origin at the top-left; flip to bottom-left.
    let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(uvs) => uvs.into_f32().map(|[u, v]| [u, 1.0 - v]).collect(),
        None => vec![[0.0, 0.0]; positions.len()],
    };

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Vertex::new(
                *p,
                normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            )
        })
        .collect();
    Ok(Geometry::from_data(vertices, indices))
}

fn import_material(material: &gltf::Material<'_>, image_ids: &[TextureId]) -> StandardMaterial {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let [er, eg, eb] = material.emissive_factor();

    let color_map = pbr.base_color_texture().and_then(|info| {
        let texture = info.texture();
        let id = image_ids.get(texture.source().index())?;
        let sampler = texture.sampler();
        Some(Texture {
            wrap_s: wrap_mode(sampler.wrap_s()),
            wrap_t: wrap_mode(sampler.wrap_t()),
            color_space: ColorSpace::Srgb,
            ..Texture::new(*id)
        })
    });

    StandardMaterial {
        name: material.name().unwrap_or("gltf").to_string(),
        color: Color::rgb(r, g, b),
        emissive: Color::rgb(er, eg, eb),
        roughness: pbr.roughness_factor(),
        metalness: pbr.metallic_factor(),
        opacity: a,
        transparent: material.alpha_mode() == gltf::material::AlphaMode::Blend,
        maps: MaterialMaps {
            color: color_map,
            ..MaterialMaps::default()
        },
        ..StandardMaterial::default()
    }
}

fn wrap_mode(mode: gltf::texture::WrappingMode) -> WrapMode {
    match mode {
        gltf::texture::WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
        gltf::texture::WrappingMode::Repeat | gltf::texture::WrappingMode::MirroredRepeat => {
            WrapMode::Repeat
        }
    }
}

fn image_to_rgba(image: gltf::image::Data) -> Result<TextureData, AssetError> {
    use gltf::image::Format;
    let rgba = match image.format {
        Format::R8G8B8A8 => image.pixels,
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => image
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&p| [p, p, p, 255]).collect(),
        other => return Err(AssetError::UnsupportedImageFormat(other)),
    };
    Ok(TextureData {
        width: image.width,
        height: image.height,
        rgba,
    })
}

/// Area-weighted smooth normals for meshes that ship without them.
fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (
            Vec3::from(positions[a]),
            Vec3::from(positions[b]),
            Vec3::from(positions[c]),
        );
        let face = (pb - pa).cross(pc - pa);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_normals_for_flat_triangle() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = compute_normals(&positions, &[0, 1, 2]);
        assert!(normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn compute_normals_ignores_out_of_range() {
        let positions = [[0.0, 0.0, 0.0]];
        let normals = compute_normals(&positions, &[0, 5, 9]);
        assert_eq!(normals, vec![[0.0, 1.0, 0.0]]);
    }

    #[test]
    fn model_primitive_count_is_recursive() {
        let leaf = ModelNode {
            primitives: vec![ModelPrimitive {
                geometry: Geometry::cuboid(1.0, 1.0, 1.0),
                material: StandardMaterial::default(),
            }],
            ..ModelNode::default()
        };
        let root = ModelNode {
            children: vec![leaf.clone(), leaf],
            ..ModelNode::default()
        };
        let model = ModelData {
            roots: vec![root],
            ..ModelData::default()
        };
        assert_eq!(model.primitive_count(), 2);
    }

    #[test]
    fn load_model_missing_file() {
        assert!(load_model("/no/such/ghost.glb").is_err());
    }

    #[test]
    fn load_minimal_gltf() {
        // One triangle, positions only, in an external buffer.
        let dir = tempfile::tempdir().unwrap();
        let bytes: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        std::fs::write(dir.path().join("tri.bin"), bytes).unwrap();
        let json = r#"{
  "asset": {"version": "2.0"},
  "scene": 0,
  "scenes": [{"nodes": [0]}],
  "nodes": [{"mesh": 0, "name": "tri", "translation": [0, 2, 0]}],
  "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
  "buffers": [{"byteLength": 36, "uri": "tri.bin"}],
  "bufferViews": [{"buffer": 0, "byteLength": 36}],
  "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0, 0, 0], "max": [1, 1, 0]}]
}"#;
        let path = dir.path().join("tri.gltf");
        std::fs::write(&path, json).unwrap();

        let model = load_model(&path).unwrap();
        assert_eq!(model.name, "tri");
        assert_eq!(model.roots.len(), 1);
        let root = &model.roots[0];
        assert_eq!(root.name.as_deref(), Some("tri"));
        assert_eq!(root.transform.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(root.primitives.len(), 1);
        let geometry = &root.primitives[0].geometry;
        assert_eq!(geometry.indices, vec![0, 1, 2]);
        assert_eq!(geometry.vertices[0].normal, [0.0, 0.0, 1.0]);
    }
}
