/// Visibility of the debug panel. Hidden until first toggled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugPanel {
    visible: bool,
}

impl DebugPanel {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flip visibility and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        tracing::debug!(visible = self.visible, "debug panel toggled");
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_hidden() {
        assert!(!DebugPanel::default().is_visible());
    }

    #[test]
    fn double_toggle_restores_visibility() {
        let mut panel = DebugPanel::default();
        assert!(panel.toggle());
        assert!(!panel.toggle());
        assert_eq!(panel, DebugPanel::default());
    }
}
