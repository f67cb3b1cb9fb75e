//! Nose Balance - balance a rolling ball by tilting your head
//!
//! Core modules:
//! - `sim`: Roll estimation, ball physics and the game phase controller
//! - `renderer`: Playfield layout and Canvas 2D drawing
//! - `platform`: Detector/camera collaborators, setup memoization, frame clock
//! - `persistence`: Best score storage
//! - `settings`: Tuning parameters from the page URL
//! - `ui`: Overlay and status text for each phase

pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod ui;

pub use error::SetupError;
pub use highscores::BestScore;
pub use settings::Tuning;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta fed to the physics step (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Continuous detection needed to finish calibration (ms)
    pub const CALIBRATION_MS: f64 = 1000.0;
    /// Countdown length before a run goes live (ms)
    pub const COUNTDOWN_MS: f64 = 3000.0;

    /// Display smoothing for the roll signal
    pub const DISPLAY_ALPHA: f32 = 0.4;
    /// Baseline smoothing during calibration (~1s of frames at 30-60 fps)
    pub const BASELINE_ALPHA: f32 = 0.1;

    /// Face width floor in pixels (edge-on or barely visible faces)
    pub const MIN_FACE_WIDTH_PX: f32 = 120.0;

    /// Stick length per pixel of face width
    pub const DEFAULT_K_L: f32 = 1.6;
    /// Ball radius per pixel of face width
    pub const DEFAULT_K_R: f32 = 0.11;

    /// Roller defaults when constructed without tuning
    pub const DEFAULT_GRAVITY: f32 = 160.0;
    pub const DEFAULT_FRICTION: f32 = 0.997;

    /// Tuned presets
    pub const NORMAL_GRAVITY: f32 = 180.0;
    pub const NORMAL_FRICTION: f32 = 0.995;
    pub const HARD_GRAVITY: f32 = 220.0;
    pub const HARD_FRICTION: f32 = 0.993;

    /// Ball may overhang the stick end by this fraction of its radius
    pub const OVERHANG_FACTOR: f32 = 0.5;
}

/// Format milliseconds as seconds with one decimal ("12.3")
pub fn format_seconds(ms: f64) -> String {
    format!("{:.1}", ms / 1000.0)
}
