use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Mean and sample standard deviation of one full trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowMoments {
    pub mean: f64,
    pub std: f64,
}

// ================================================================================================
// Rolling Moments
// ================================================================================================

/// Trailing fixed-size window over a stream of observations.
///
/// `update` returns `Some` only once the window is full, so the first `window - 1`
/// observations never produce output. Moments are recomputed from the buffered values on every
/// update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingMoments {
    window_size: usize,
    buffer: VecDeque<f64>,
}

impl RollingMoments {
    /// `window_size` must be at least 1; callers validate before constructing.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn update(&mut self, value: f64) -> Option<WindowMoments> {
        // 1. Push the new observation, evicting the oldest one once full
        self.buffer.push_back(value);
        if self.buffer.len() > self.window_size {
            self.buffer.pop_front();
        }

        // 2. Not warm yet
        if self.buffer.len() < self.window_size {
            return None;
        }

        // 3. Two-pass moments over the window
        let n = self.buffer.len() as f64;
        let mean = self.buffer.iter().sum::<f64>() / n;

        // A single observation has no spread; report 0 rather than NaN
        let std = if self.buffer.len() < 2 {
            0.0
        } else {
            let ss = self
                .buffer
                .iter()
                .map(|x| {
                    let d = x - mean;
                    d * d
                })
                .sum::<f64>();
            (ss / (n - 1.0)).sqrt()
        };

        Some(WindowMoments { mean, std })
    }

    /// Clears the window, e.g. before switching to the next ticker.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
