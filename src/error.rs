//! Setup errors
//!
//! Only detector and camera setup can fail. Everything after that degrades to
//! "no detection this frame" instead of erroring.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Camera access was denied")]
    CameraDenied,

    #[error("No camera was found")]
    CameraNotFound,

    #[error("Webcam not supported in this browser")]
    CameraUnsupported,

    #[error("Face tracker failed to load: {0}")]
    DetectorLoad(String),

    #[error("{0}")]
    Other(String),
}

impl SetupError {
    /// Classify a browser `DOMException` by its `name`
    pub fn from_dom_error(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" => SetupError::CameraDenied,
            "NotFoundError" | "OverconstrainedError" => SetupError::CameraNotFound,
            "NotSupportedError" => SetupError::CameraUnsupported,
            _ => SetupError::Other(message.to_string()),
        }
    }

    /// Text shown in the "Camera Needed" overlay
    pub fn user_message(&self) -> String {
        match self {
            SetupError::CameraDenied => "Camera access was denied. Enable it to play.".to_string(),
            SetupError::CameraNotFound => {
                "No camera was found. Connect one and try again.".to_string()
            }
            SetupError::CameraUnsupported => "Webcam not supported in this browser".to_string(),
            SetupError::DetectorLoad(msg) => format!("Face tracker failed to load: {msg}"),
            SetupError::Other(msg) if msg.is_empty() => "Unexpected error occurred.".to_string(),
            SetupError::Other(msg) => msg.clone(),
        }
    }
}
