use crate::geometry::Geometry;
use crate::material::StandardMaterial;
use crate::texture::{TextureData, TextureId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A handle referencing a mesh in the [`AssetStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u64);

/// A handle referencing a material in the [`AssetStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialHandle(pub u64);

/// Registry of meshes, materials and decoded texture sources.
///
/// Meshes and materials are append-only; handles stay valid for the life
/// of the store. Texture sources arrive asynchronously, so materials may
/// reference a [`TextureId`] before its pixels exist. `texture_generation`
/// bumps on every insert so GPU caches know when to rebind.
#[derive(Debug, Default)]
pub struct AssetStore {
    meshes: Vec<Geometry>,
    materials: Vec<StandardMaterial>,
    textures: BTreeMap<TextureId, TextureData>,
    texture_generation: u64,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, geometry: Geometry) -> MeshHandle {
        self.meshes.push(geometry);
        MeshHandle(self.meshes.len() as u64 - 1)
    }

    pub fn add_material(&mut self, material: StandardMaterial) -> MaterialHandle {
        self.materials.push(material);
        MaterialHandle(self.materials.len() as u64 - 1)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Geometry> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&StandardMaterial> {
        self.materials.get(handle.0 as usize)
    }

    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut StandardMaterial> {
        self.materials.get_mut(handle.0 as usize)
    }

    /// Store decoded pixels for a texture source.
    pub fn insert_texture(&mut self, id: TextureId, data: TextureData) {
        self.textures.insert(id, data);
        self.texture_generation += 1;
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(&id)
    }

    pub fn has_texture(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    pub fn texture_generation(&self) -> u64 {
        self.texture_generation
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialHandle, &StandardMaterial)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialHandle(i as u64), m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_sequential() {
        let mut store = AssetStore::new();
        let a = store.add_mesh(Geometry::cuboid(1.0, 1.0, 1.0));
        let b = store.add_mesh(Geometry::sphere(1.0, 8, 8));
        assert_eq!(a, MeshHandle(0));
        assert_eq!(b, MeshHandle(1));
        assert_eq!(store.mesh(b).unwrap().vertex_count(), 81);
        assert!(store.mesh(MeshHandle(9)).is_none());
    }

    #[test]
    fn material_mutation() {
        let mut store = AssetStore::new();
        let h = store.add_material(StandardMaterial::named("ghost"));
        store.material_mut(h).unwrap().opacity = 0.2;
        assert_eq!(store.material(h).unwrap().opacity, 0.2);
        assert_eq!(store.materials().count(), 1);
    }

    #[test]
    fn texture_insert_bumps_generation() {
        let mut store = AssetStore::new();
        let id = TextureId::from_path("grave/diff.webp");
        assert!(!store.has_texture(id));
        assert_eq!(store.texture_generation(), 0);

        store.insert_texture(id, TextureData::solid([1, 2, 3, 4]));
        assert!(store.has_texture(id));
        assert_eq!(store.texture_generation(), 1);
        assert_eq!(store.texture_count(), 1);
    }
}
