//! Head roll estimation from face landmarks
//!
//! Landmark indices follow the MediaPipe face mesh (468/478 points).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::smoothing::Ema;
use super::state::GamePhase;
use crate::consts::*;

/// Outer corner of the left eye
pub const LEFT_EYE_OUTER: usize = 33;
/// Outer corner of the right eye
pub const RIGHT_EYE_OUTER: usize = 263;
/// Tip of the nose
pub const NOSE_TIP: usize = 1;

/// A single face landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth (unused)
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Pixel dimensions of the current video frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

impl FrameSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Per-frame measurements derived from one face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Calibrated, smoothed head roll (radians)
    pub roll: f32,
    pub nose_px: Vec2,
    pub face_width_px: f32,
    pub baseline: f32,
}

/// Angle of the line between the outer eye corners (radians).
///
/// Uses normalized coordinates directly.
pub fn compute_roll(left_eye: Landmark, right_eye: Landmark) -> f32 {
    (right_eye.y - left_eye.y).atan2(right_eye.x - left_eye.x)
}

pub fn normalized_to_pixels(point: Landmark, frame: FrameSize) -> Vec2 {
    Vec2::new(point.x * frame.width, point.y * frame.height)
}

/// Eye-corner distance in pixels, floored at [`MIN_FACE_WIDTH_PX`]
pub fn estimate_face_width(left_eye: Landmark, right_eye: Landmark, frame: FrameSize) -> f32 {
    let left = normalized_to_pixels(left_eye, frame);
    let right = normalized_to_pixels(right_eye, frame);
    let width = left.distance(right);
    if width.is_finite() {
        width.max(MIN_FACE_WIDTH_PX)
    } else {
        MIN_FACE_WIDTH_PX
    }
}

/// Turns raw landmarks into a calibrated roll signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollEstimator {
    display: Ema,
    baseline: Ema,
    has_baseline: bool,
    roll: f32,
    nose_px: Vec2,
    face_width_px: f32,
}

impl Default for RollEstimator {
    fn default() -> Self {
        Self::new(DISPLAY_ALPHA, BASELINE_ALPHA)
    }
}

impl RollEstimator {
    pub fn new(display_alpha: f32, baseline_alpha: f32) -> Self {
        Self {
            display: Ema::new(display_alpha),
            baseline: Ema::new(baseline_alpha),
            has_baseline: false,
            roll: 0.0,
            nose_px: Vec2::ZERO,
            face_width_px: MIN_FACE_WIDTH_PX,
        }
    }

    /// Forget the level-head reference and the smoothed roll (on every
    /// calibration entry)
    pub fn reset_baseline(&mut self) {
        self.baseline.reset(0.0);
        self.display.reset(0.0);
        self.roll = 0.0;
        self.has_baseline = false;
    }

    /// Process one frame of landmarks.
    ///
    /// Returns `None` if the sequence is missing any of the eye or nose
    /// landmarks; the frame then counts as having no face.
    pub fn update(
        &mut self,
        landmarks: &[Landmark],
        phase: GamePhase,
        frame: FrameSize,
    ) -> Option<Detection> {
        let left = *landmarks.get(LEFT_EYE_OUTER)?;
        let right = *landmarks.get(RIGHT_EYE_OUTER)?;
        let nose = *landmarks.get(NOSE_TIP)?;

        let raw = compute_roll(left, right);

        if phase == GamePhase::Calibrate {
            self.baseline.update(raw);
            self.has_baseline = true;
        }

        let smoothed = self.display.update(raw);
        self.roll = if self.has_baseline {
            smoothed - self.baseline.value()
        } else {
            0.0
        };

        self.nose_px = normalized_to_pixels(nose, frame);
        self.face_width_px = estimate_face_width(left, right, frame);

        Some(self.detection())
    }

    pub fn detection(&self) -> Detection {
        Detection {
            roll: self.roll,
            nose_px: self.nose_px,
            face_width_px: self.face_width_px,
            baseline: self.baseline(),
        }
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    pub fn baseline(&self) -> f32 {
        if self.has_baseline {
            self.baseline.value()
        } else {
            0.0
        }
    }

    pub fn has_baseline(&self) -> bool {
        self.has_baseline
    }
}

/// Build a landmark sequence with only the eye corners and nose set
#[cfg(test)]
pub(crate) fn face(left: (f32, f32), right: (f32, f32), nose: (f32, f32)) -> Vec<Landmark> {
    let mut landmarks = vec![Landmark::default(); 478];
    landmarks[LEFT_EYE_OUTER] = Landmark::new(left.0, left.1);
    landmarks[RIGHT_EYE_OUTER] = Landmark::new(right.0, right.1);
    landmarks[NOSE_TIP] = Landmark::new(nose.0, nose.1);
    landmarks
}
