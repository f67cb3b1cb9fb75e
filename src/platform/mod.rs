//! Platform abstraction layer
//!
//! Handles the collaborators the game loop talks to:
//! - Face detection (MediaPipe in the browser)
//! - One-shot async setup (detector, camera) with memoization
//! - Frame timing and visibility resync

pub mod time;

pub use time::FrameClock;

use crate::sim::Landmark;

/// Produces face landmarks for the current video frame
pub trait Detector {
    /// Landmarks of the first face, or `None` if no face was found.
    ///
    /// `timestamp_ms` must never decrease between calls.
    fn detect(&mut self, timestamp_ms: f64) -> Option<Vec<Landmark>>;

    /// Release the model. Best-effort.
    fn close(&mut self) {}
}

/// Memoized result of a one-time async setup call.
///
/// A request made while the first one is still in flight does not start a
/// second one; a failed attempt can be retried.
#[derive(Debug)]
pub enum SetupSlot<T> {
    Empty,
    Pending,
    Ready(T),
}

impl<T> Default for SetupSlot<T> {
    fn default() -> Self {
        SetupSlot::Empty
    }
}

impl<T> SetupSlot<T> {
    /// Claim the slot. Returns true if the caller should start the setup.
    pub fn begin(&mut self) -> bool {
        match self {
            SetupSlot::Empty => {
                *self = SetupSlot::Pending;
                true
            }
            SetupSlot::Pending | SetupSlot::Ready(_) => false,
        }
    }

    /// Store the outcome of the setup started by [`SetupSlot::begin`]
    pub fn finish<E>(&mut self, result: Result<T, E>) -> Result<(), E> {
        match result {
            Ok(value) => {
                *self = SetupSlot::Ready(value);
                Ok(())
            }
            Err(err) => {
                *self = SetupSlot::Empty;
                Err(err)
            }
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            SetupSlot::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            SetupSlot::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SetupSlot::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SetupSlot::Ready(_))
    }

    /// Take the value out for teardown
    pub fn take(&mut self) -> Option<T> {
        match std::mem::take(self) {
            SetupSlot::Ready(value) => Some(value),
            other => {
                *self = other;
                None
            }
        }
    }
}

/// Replays a fixed script of detections, for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    frames: std::collections::VecDeque<Option<Vec<Landmark>>>,
    last_timestamp: f64,
    pub closed: bool,
}

impl ScriptedDetector {
    pub fn new(frames: impl IntoIterator<Item = Option<Vec<Landmark>>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            last_timestamp: f64::NEG_INFINITY,
            closed: false,
        }
    }

    pub fn push(&mut self, frame: Option<Vec<Landmark>>) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, timestamp_ms: f64) -> Option<Vec<Landmark>> {
        debug_assert!(timestamp_ms >= self.last_timestamp, "timestamps must not decrease");
        self.last_timestamp = timestamp_ms;
        self.frames.pop_front().flatten()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
