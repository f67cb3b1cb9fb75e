//! Frame timing

use crate::consts::MAX_FRAME_DT;

/// Turns animation-frame timestamps into clamped physics deltas
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous frame, clamped to [0, MAX_FRAME_DT].
    ///
    /// The first frame after construction or [`FrameClock::resync`] yields 0.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt.clamp(0.0, MAX_FRAME_DT)
    }

    /// Re-anchor after the page becomes visible again
    pub fn resync(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
    }

    pub fn last_ms(&self) -> Option<f64> {
        self.last_ms
    }
}
