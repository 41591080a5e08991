//! Input: raw window events mapped to scene actions.
//!
//! # Invariants
//! - The frame loop sees [`Action`]s only; window-system types stay in the app.
//! - The debug panel starts hidden; two toggles restore the prior state.

pub mod action;
pub mod panel;

pub use action::{Action, InputEvent, InputMapper, KeyAction, KeyBindings};
pub use panel::DebugPanel;
