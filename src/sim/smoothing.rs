//! Exponential moving average

use serde::{Deserialize, Serialize};

/// Single-pole low-pass filter.
///
/// The first sample after construction or [`Ema::reset`] passes through
/// unchanged so the output never drifts up from an arbitrary seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ema {
    value: f32,
    alpha: f32,
    initialized: bool,
}

impl Ema {
    pub fn new(alpha: f32) -> Self {
        debug_assert!(alpha > 0.0 && alpha <= 1.0, "alpha must be in (0, 1]");
        Self {
            value: 0.0,
            alpha: alpha.clamp(f32::EPSILON, 1.0),
            initialized: false,
        }
    }

    /// Blend a new sample into the average and return it
    pub fn update(&mut self, sample: f32) -> f32 {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
        self.value
    }

    /// Store `value` and make the next sample pass through
    pub fn reset(&mut self, value: f32) {
        self.value = value;
        self.initialized = false;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
