//! Scene kernel: the object graph, its lights and environment, and the frame
//! loop that animates it.
//!
//! # Invariants
//! - The scene is owned by one thread; loaders hand results to it by value.
//! - Removing a node removes its whole subtree.
//! - The frame loop only touches the ghost subtree, and only once it exists.

pub mod environment;
pub mod frame;
pub mod graph;
pub mod light;
pub mod scene;

pub use environment::{Environment, Fog, SkyParams};
pub use frame::{FrameClock, FrameLoop, FrameTick, ghost_opacity, ghost_position};
pub use graph::{MeshNode, Node, NodeKind, SceneError, SceneGraph};
pub use light::{AmbientLight, DirectionalLight, Light, PointLight, ShadowConfig};
pub use scene::{PlacedLight, Scene};
