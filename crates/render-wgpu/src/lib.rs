//! wgpu render backend for the haunted house scene.
//!
//! Draws one directional shadow map, the analytic sky box, instanced opaque
//! batches and then blended draws far to near. Meshes, materials and
//! textures are uploaded lazily the first time a frame references them.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - A material whose texture has not arrived yet renders without that map.

mod gpu;
mod plan;
mod resources;
mod shaders;

pub use gpu::{RenderStats, WgpuRenderer};
