//! Rendering adapter: everything a backend needs that does not touch a GPU.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Render state derives from scene state and the camera each frame.

mod camera;
mod draw;
mod orbit;
mod renderer;
mod sky;

pub use camera::PerspectiveCamera;
pub use draw::{
    BlendedDraw, DirectionalLightData, DrawBatch, DrawInstance, FrameData, LightSet,
    MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS, PointLightData, ShadowView, extract_frame,
};
pub use orbit::OrbitControls;
pub use renderer::{DebugTextRenderer, Renderer};
pub use sky::{SkyUniforms, TOTAL_RAYLEIGH};
