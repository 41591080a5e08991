//! Asset pipeline: procedural geometry, materials, textures and glTF models.
//!
//! Assets are referenced by handle. Texture sources are content-addressed by
//! a hash of their relative path so the same file requested twice resolves
//! to one decoded image. The renderer consumes assets by handle, never by
//! raw file paths.

pub mod geometry;
pub mod material;
pub mod model;
pub mod store;
pub mod texture;

pub use geometry::{Geometry, Vertex};
pub use material::{MaterialMaps, StandardMaterial};
pub use model::{ModelData, ModelNode, ModelPrimitive, load_model};
pub use store::{AssetStore, MaterialHandle, MeshHandle};
pub use texture::{ColorSpace, Texture, TextureData, TextureId, WrapMode, load_texture};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("glTF import error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("primitive {mesh}/{primitive} has no positions")]
    MissingPositions { mesh: String, primitive: usize },
    #[error("unsupported glTF image format: {0:?}")]
    UnsupportedImageFormat(gltf::image::Format),
}
