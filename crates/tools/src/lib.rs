//! Developer tooling: scene inspector, debug-panel tweaks, frame timing.
//!
//! # Invariants
//! - The inspector never mutates the scene.
//! - Tweaks are clamped to their published ranges before they are applied.

mod inspector;
mod timer;
mod tweaks;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};
pub use timer::FrameTimer;
pub use tweaks::{
    CAMERA_AXIS, CameraTweaks, FLOOR_DISPLACEMENT_BIAS, FLOOR_DISPLACEMENT_SCALE, FloorTweaks,
    TweakRange,
};

/// Errors from applying debug tweaks.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolsError {
    #[error("material {0} not found")]
    MaterialNotFound(u64),
}
