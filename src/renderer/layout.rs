//! Playfield geometry
//!
//! Stick space has its origin at the nose, x along the stick and y down.
//! The stick is rotated by `-roll` so it stays level with the eyes in the
//! mirrored view.

use glam::{Mat2, Vec2};

use crate::consts::{DEFAULT_K_L, DEFAULT_K_R};
use crate::sim::{FrameSnapshot, Roller};

/// Stick thickness relative to ball radius, and its pixel bounds
const STICK_THICKNESS_FACTOR: f32 = 0.6;
const STICK_MIN_THICKNESS: f32 = 6.0;
const STICK_MAX_THICKNESS: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayfieldLayout {
    /// Nose position in (unmirrored) frame pixels
    pub origin: Vec2,
    /// Canvas rotation applied to stick space (radians)
    pub rotation: f32,
    pub length: f32,
    pub thickness: f32,
    pub ball_radius: f32,
    /// Ball centre in stick space
    pub ball: Vec2,
}

impl PlayfieldLayout {
    pub fn new(nose_px: Vec2, face_width_px: f32, roll: f32, roller: &Roller) -> Self {
        let length = if roller.length > 0.0 {
            roller.length
        } else {
            DEFAULT_K_L * face_width_px
        };
        let ball_radius = if roller.radius > 0.0 {
            roller.radius
        } else {
            DEFAULT_K_R * face_width_px
        };
        let thickness = (ball_radius * STICK_THICKNESS_FACTOR)
            .clamp(STICK_MIN_THICKNESS, STICK_MAX_THICKNESS);

        Self {
            origin: nose_px,
            rotation: -roll,
            length,
            thickness,
            ball_radius,
            ball: Vec2::new(roller.x, -ball_radius),
        }
    }

    /// Layout for a frame, `None` when no face was found
    pub fn from_snapshot(snapshot: &FrameSnapshot) -> Option<Self> {
        let nose = snapshot.nose_px?;
        let width = snapshot.face_width_px?;
        Some(Self::new(nose, width, snapshot.roll, &snapshot.roller))
    }

    /// Map a stick-space point to frame pixels
    pub fn to_frame(&self, point: Vec2) -> Vec2 {
        self.origin + Mat2::from_angle(self.rotation) * point
    }

    /// Stick end points in frame pixels
    pub fn stick_ends(&self) -> (Vec2, Vec2) {
        let half = self.length / 2.0;
        (
            self.to_frame(Vec2::new(-half, 0.0)),
            self.to_frame(Vec2::new(half, 0.0)),
        )
    }

    pub fn ball_center(&self) -> Vec2 {
        self.to_frame(self.ball)
    }
}

/// Destination rect `(x, y, w, h)` that covers the canvas with the video
/// while keeping its aspect ratio
pub fn cover_rect(canvas: Vec2, video: Vec2) -> (f32, f32, f32, f32) {
    if canvas.y <= 0.0 || video.x <= 0.0 || video.y <= 0.0 {
        return (0.0, 0.0, canvas.x, canvas.y);
    }
    let aspect_canvas = canvas.x / canvas.y;
    let aspect_video = video.x / video.y;
    if aspect_video > aspect_canvas {
        let draw_width = canvas.y * aspect_video;
        (-(draw_width - canvas.x) / 2.0, 0.0, draw_width, canvas.y)
    } else {
        let draw_height = canvas.x / aspect_video;
        (0.0, -(draw_height - canvas.y) / 2.0, canvas.x, draw_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RollerConstants;

    fn roller(length: f32, radius: f32, x: f32) -> Roller {
        let mut roller = Roller::new(RollerConstants::default());
        roller.configure(length, radius);
        roller.x = x;
        roller
    }

    #[test]
    fn test_level_stick() {
        let layout = PlayfieldLayout::new(Vec2::new(320.0, 240.0), 150.0, 0.0, &roller(240.0, 16.5, 10.0));
        let (left, right) = layout.stick_ends();
        assert!(left.distance(Vec2::new(200.0, 240.0)) < 1e-3);
        assert!(right.distance(Vec2::new(440.0, 240.0)) < 1e-3);
        assert!(layout.ball_center().distance(Vec2::new(330.0, 223.5)) < 1e-3);
    }

    #[test]
    fn test_thickness_clamped() {
        let thin = PlayfieldLayout::new(Vec2::ZERO, 120.0, 0.0, &roller(100.0, 2.0, 0.0));
        assert_eq!(thin.thickness, 6.0);
        let thick = PlayfieldLayout::new(Vec2::ZERO, 120.0, 0.0, &roller(100.0, 100.0, 0.0));
        assert_eq!(thick.thickness, 28.0);
    }

    #[test]
    fn test_unconfigured_roller_uses_defaults() {
        let layout = PlayfieldLayout::new(Vec2::ZERO, 200.0, 0.0, &Roller::default());
        assert!((layout.length - 320.0).abs() < 1e-3);
        assert!((layout.ball_radius - 22.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_follows_roll() {
        let layout = PlayfieldLayout::new(
            Vec2::ZERO,
            150.0,
            std::f32::consts::FRAC_PI_2,
            &roller(200.0, 10.0, 0.0),
        );
        let (_, right) = layout.stick_ends();
        assert!(right.distance(Vec2::new(0.0, -100.0)) < 1e-3);
    }

    #[test]
    fn test_cover_rect() {
        // Wider video is cropped left/right
        let (x, y, w, h) = cover_rect(Vec2::new(400.0, 300.0), Vec2::new(1600.0, 900.0));
        assert_eq!((y, h), (0.0, 300.0));
        assert!((w - 533.333).abs() < 1e-2);
        assert!((x + 66.666).abs() < 1e-2);

        // Taller video is cropped top/bottom
        let (x, y, w, h) = cover_rect(Vec2::new(400.0, 300.0), Vec2::new(300.0, 400.0));
        assert_eq!((x, w), (0.0, 400.0));
        assert!((h - 533.333).abs() < 1e-2);
        assert!((y + 66.666).abs() < 1e-2);
    }
}
