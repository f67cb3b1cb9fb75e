//! Presentation
//!
//! Pure playfield geometry, plus Canvas 2D drawing in the browser build.

pub mod layout;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use layout::{PlayfieldLayout, cover_rect};
