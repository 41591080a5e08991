use std::collections::VecDeque;
use std::time::Duration;

/// Rolling frame-time statistics over the last `capacity` frames.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(120)
    }
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, delta: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(delta);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn average(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().sum();
        Some(total / self.samples.len() as u32)
    }

    /// Frames per second over the window; 0 until a non-zero frame is seen.
    pub fn fps(&self) -> f64 {
        match self.average() {
            Some(avg) if !avg.is_zero() => 1.0 / avg.as_secs_f64(),
            _ => 0.0,
        }
    }

    pub fn worst(&self) -> Option<Duration> {
        self.samples.iter().max().copied()
    }
}
