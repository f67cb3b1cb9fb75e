//! Overlay and status text
//!
//! The controller decides what the player should read; the browser driver
//! copies it into the DOM.

use serde::{Deserialize, Serialize};

use crate::format_seconds;

pub const STATUS_CALIBRATING: &str = "Calibrating… hold steady";
pub const STATUS_FIND_FACE: &str = "Find your face in frame";

/// Modal card over the video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    pub title: String,
    pub body: String,
    /// Button label, `None` hides the button
    pub action: Option<String>,
}

impl Overlay {
    fn new(title: &str, body: impl Into<String>, action: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            body: body.into(),
            action: action.map(str::to_string),
        }
    }

    pub fn title_screen() -> Self {
        Self::new(
            "Nose Balance",
            "Balance the ball by tilting your head.",
            Some("Play"),
        )
    }

    pub fn loading(stage: LoadingStage) -> Self {
        Self::new("Preparing", stage.message(), None)
    }

    /// Countdown card; body is the whole seconds left, blank at zero
    pub fn countdown(seconds_left: u32) -> Self {
        let body = if seconds_left == 0 {
            String::new()
        } else {
            seconds_left.to_string()
        };
        Self::new("Get Ready", body, None)
    }

    pub fn game_over(score_ms: f64) -> Self {
        Self::new(
            "Game Over",
            format!("You lasted {} seconds", format_seconds(score_ms)),
            Some("Play Again"),
        )
    }

    pub fn setup_failed(message: impl Into<String>) -> Self {
        Self::new("Camera Needed", message, Some("Try Again"))
    }
}

/// Which async setup step is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadingStage {
    Detector,
    Camera,
}

impl LoadingStage {
    pub fn message(&self) -> &'static str {
        match self {
            LoadingStage::Detector => "Loading face tracker…",
            LoadingStage::Camera => "Connecting to your camera…",
        }
    }
}

/// Everything textual on screen besides the score readouts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub overlay: Option<Overlay>,
    pub status: Option<String>,
}

impl Hud {
    pub fn show_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    pub fn hide_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn show_status(&mut self, text: &str) {
        self.status = Some(text.to_string());
    }

    pub fn hide_status(&mut self) {
        self.status = None;
    }
}
