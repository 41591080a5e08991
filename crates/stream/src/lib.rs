//! Asset streaming: background decoding of textures and models.
//!
//! # Invariants
//! - The loader thread never touches the scene. Results cross back over a
//!   channel and are applied by whoever owns the scene.
//! - A failed load is reported once and never retried.

mod loader;
mod tracker;

pub use loader::{AssetLoader, AssetStreamer, FileLoader, LoadEvent, LoadRequest};
pub use tracker::{LoadCounts, LoadState, LoadTracker};

/// Errors from the streaming subsystem.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("failed to spawn loader thread: {0}")]
    Spawn(std::io::Error),
    #[error("loader thread has stopped")]
    Disconnected,
}
