use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A high-level action produced from raw input.
///
/// The frame loop consumes actions, never window-system events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Show or hide the debug panel.
    ToggleDebugPanel,
    /// Rotate the orbit camera by a pointer delta in physical pixels.
    Orbit(Vec2),
}

/// Actions that can be bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    ToggleDebugPanel,
}

impl From<KeyAction> for Action {
    fn from(action: KeyAction) -> Self {
        match action {
            KeyAction::ToggleDebugPanel => Action::ToggleDebugPanel,
        }
    }
}

/// Window-system independent input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A key press carrying the character it produced.
    KeyPressed(String),
    /// Primary pointer button pressed or released.
    PointerButton { pressed: bool },
    /// Pointer moved to a position in physical pixels.
    PointerMoved(Vec2),
    /// Pointer left the window.
    PointerLeft,
}

/// Key-to-action table. Keys match on the produced character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    bindings: BTreeMap<String, KeyAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert("h".to_string(), KeyAction::ToggleDebugPanel);
        Self { bindings }
    }
}

impl KeyBindings {
    pub fn bind(&mut self, key: impl Into<String>, action: KeyAction) {
        self.bindings.insert(key.into(), action);
    }

    /// Case-sensitive lookup: `H` is a different key from `h`.
    pub fn lookup(&self, key: &str) -> Option<KeyAction> {
        self.bindings.get(key).copied()
    }
}

/// Turns [`InputEvent`]s into [`Action`]s.
///
/// Tracks primary-button drag state so pointer motion only orbits while
/// the button is held.
#[derive(Debug, Default)]
pub struct InputMapper {
    bindings: KeyBindings,
    dragging: bool,
    last_pointer: Option<Vec2>,
}

impl InputMapper {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn handle(&mut self, event: &InputEvent) -> Option<Action> {
        match event {
            InputEvent::KeyPressed(key) => self.bindings.lookup(key).map(Action::from),
            InputEvent::PointerButton { pressed } => {
                self.dragging = *pressed;
                None
            }
            InputEvent::PointerMoved(position) => {
                let previous = self.last_pointer.replace(*position);
                match previous {
                    Some(previous) if self.dragging => {
                        let delta = *position - previous;
                        (delta != Vec2::ZERO).then_some(Action::Orbit(delta))
                    }
                    _ => None,
                }
            }
            InputEvent::PointerLeft => {
                self.dragging = false;
                self.last_pointer = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h_toggles_debug_panel() {
        let mut mapper = InputMapper::default();
        assert_eq!(
            mapper.handle(&InputEvent::KeyPressed("h".into())),
            Some(Action::ToggleDebugPanel)
        );
        assert_eq!(mapper.handle(&InputEvent::KeyPressed("H".into())), None);
        assert_eq!(mapper.handle(&InputEvent::KeyPressed("x".into())), None);
    }

    #[test]
    fn rebinding_keys() {
        let mut bindings = KeyBindings::default();
        bindings.bind("g", KeyAction::ToggleDebugPanel);
        let mut mapper = InputMapper::new(bindings);
        assert_eq!(
            mapper.handle(&InputEvent::KeyPressed("g".into())),
            Some(Action::ToggleDebugPanel)
        );
    }

    #[test]
    fn pointer_motion_orbits_only_while_dragging() {
        let mut mapper = InputMapper::default();
        assert_eq!(mapper.handle(&InputEvent::PointerMoved(Vec2::new(10.0, 10.0))), None);

        mapper.handle(&InputEvent::PointerButton { pressed: true });
        assert!(mapper.is_dragging());
        assert_eq!(
            mapper.handle(&InputEvent::PointerMoved(Vec2::new(15.0, 8.0))),
            Some(Action::Orbit(Vec2::new(5.0, -2.0)))
        );

        mapper.handle(&InputEvent::PointerButton { pressed: false });
        assert_eq!(mapper.handle(&InputEvent::PointerMoved(Vec2::new(30.0, 8.0))), None);
    }

    #[test]
    fn leaving_window_ends_drag() {
        let mut mapper = InputMapper::default();
        mapper.handle(&InputEvent::PointerButton { pressed: true });
        mapper.handle(&InputEvent::PointerMoved(Vec2::ZERO));
        mapper.handle(&InputEvent::PointerLeft);
        assert!(!mapper.is_dragging());
        // First move after re-entering has no previous position.
        mapper.handle(&InputEvent::PointerButton { pressed: true });
        assert_eq!(mapper.handle(&InputEvent::PointerMoved(Vec2::ONE)), None);
    }

    #[test]
    fn bindings_deserialize() {
        let bindings: KeyBindings =
            serde_json::from_str(r#"{"bindings":{"p":"toggle_debug_panel"}}"#).unwrap();
        assert_eq!(bindings.lookup("p"), Some(KeyAction::ToggleDebugPanel));
        assert_eq!(bindings.lookup("h"), None);
    }
}
