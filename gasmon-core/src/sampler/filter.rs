//! Smoothing filters for weight readings

use heapless::{Deque, Vec};

use crate::config::{FilterConfig, FilterKind, MAX_FILTER_WINDOW};

/// Sliding-window filter over the most recent weight readings
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    kind: FilterKind,
    window: usize,
    history: Deque<f32, MAX_FILTER_WINDOW>,
}

impl SmoothingFilter {
    /// Create a filter; the window is clamped to `1..=MAX_FILTER_WINDOW`
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            kind: config.kind,
            window: (config.window as usize).clamp(1, MAX_FILTER_WINDOW),
            history: Deque::new(),
        }
    }

    /// Push a reading and return the filtered value
    pub fn push(&mut self, value: f32) -> f32 {
        while self.history.len() >= self.window {
            self.history.pop_front();
        }
        // Cannot fail: at least one slot was freed above
        let _ = self.history.push_back(value);
        self.value().unwrap_or(value)
    }

    /// Current filtered value, if any readings have been pushed
    pub fn value(&self) -> Option<f32> {
        if self.history.is_empty() {
            return None;
        }
        match self.kind {
            FilterKind::MovingAverage => {
                let sum: f32 = self.history.iter().sum();
                Some(sum / self.history.len() as f32)
            }
            FilterKind::Median => {
                let mut sorted: Vec<f32, MAX_FILTER_WINDOW> =
                    self.history.iter().copied().collect();
                sorted.sort_unstable_by(|a, b| {
                    a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal)
                });
                let n = sorted.len();
                if n % 2 == 1 {
                    Some(sorted[n / 2])
                } else {
                    Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
                }
            }
        }
    }

    /// Number of readings currently in the window
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Check if no readings are buffered
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Drop all buffered readings
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
