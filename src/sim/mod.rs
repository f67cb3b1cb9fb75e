//! Game core
//!
//! Everything here is pure and driven by explicit timestamps:
//! - No clocks, DOM or camera access
//! - Phase changes only through the transition table
//! - The ball only moves while LIVE

pub mod roller;
pub mod smoothing;
pub mod state;
pub mod tick;
pub mod tracker;

pub use roller::{Roller, RollerConstants};
pub use smoothing::Ema;
pub use state::{Effect, GameEvent, GamePhase, PhaseEvent, Transition, transition};
pub use tick::{FrameSnapshot, GameState, TickInput, tick};
pub use tracker::{
    Detection, FrameSize, LEFT_EYE_OUTER, Landmark, NOSE_TIP, RIGHT_EYE_OUTER, RollEstimator,
    compute_roll, estimate_face_width, normalized_to_pixels,
};
