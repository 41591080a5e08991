//! Builds the haunted house scene.
//!
//! [`assemble`] constructs the static graph once from a [`SceneConfig`];
//! [`attach_model`] adds the tree and ghost when their loads complete.
//! [`HauntSession`] ties both to the frame loop and the asset streamer.

pub mod assemble;
pub mod config;
pub mod graves;
pub mod models;
pub mod session;

pub use assemble::{AssembleError, Assembly, SceneHandles, TextureManifest, TextureRequest, assemble};
pub use config::{
    AssetsConfig, BushConfig, CameraConfig, ConfigError, FloorConfig, GraveConfig, HouseConfig,
    LightsConfig, ModelPlacement, ModelsConfig, SceneConfig,
};
pub use graves::{GravePlacement, place_graves};
pub use models::{ModelSlot, attach_model};
pub use session::HauntSession;
