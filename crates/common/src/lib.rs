//! Shared value types used across the scene crates.
//!
//! Nothing in here owns scene state; these are plain `Copy` values that the
//! kernel, assembler and renderers pass around.

pub mod color;
pub mod types;
pub mod viewport;

pub use color::{Color, ColorError};
pub use types::{NodeId, Transform};
pub use viewport::Viewport;
