use std::collections::BTreeSet;

/// Overall readiness of the asynchronously loaded models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No model has arrived yet.
    Loading,
    /// Some, but not all, models are in the scene.
    ReadyPartial,
    /// Every expected model is in the scene.
    ReadyFull,
}

/// Counts of finished loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadCounts {
    pub textures_loaded: usize,
    pub textures_failed: usize,
    pub models_loaded: usize,
    pub models_failed: usize,
}

/// Tracks which models the scene is waiting for.
///
/// A failed model never arrives, so the state stays below `ReadyFull`.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    expected: BTreeSet<String>,
    arrived: BTreeSet<String>,
    failed: BTreeSet<String>,
    counts: LoadCounts,
}

impl LoadTracker {
    pub fn new<I, S>(expected_models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expected: expected_models.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn model_loaded(&mut self, key: &str) {
        if self.expected.contains(key) && self.arrived.insert(key.to_string()) {
            self.counts.models_loaded += 1;
            tracing::debug!("model {key} arrived, now {:?}", self.state());
        }
    }

    pub fn model_failed(&mut self, key: &str) {
        if self.failed.insert(key.to_string()) {
            self.counts.models_failed += 1;
        }
    }

    pub fn texture_loaded(&mut self) {
        self.counts.textures_loaded += 1;
    }

    pub fn texture_failed(&mut self) {
        self.counts.textures_failed += 1;
    }

    pub fn state(&self) -> LoadState {
        if self.arrived.len() == self.expected.len() {
            LoadState::ReadyFull
        } else if self.arrived.is_empty() {
            LoadState::Loading
        } else {
            LoadState::ReadyPartial
        }
    }

    pub fn counts(&self) -> LoadCounts {
        self.counts
    }

    /// Whether every expected model has either arrived or failed.
    pub fn settled(&self) -> bool {
        self.expected
            .iter()
            .all(|k| self.arrived.contains(k) || self.failed.contains(k))
    }
}
