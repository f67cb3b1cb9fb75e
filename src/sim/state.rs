//! Game phases and the transition table
//!
//! Transitions are pure: `(phase, event) -> Option<Transition>`. The controller
//! in `tick` applies the returned entry effects.

use serde::{Deserialize, Serialize};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GamePhase {
    /// Idle, waiting for the player to press Play
    #[default]
    Init,
    /// Waiting for the detector and camera to come up
    Loading,
    /// Capturing the player's level-head baseline
    Calibrate,
    /// Fixed countdown before the run starts
    Countdown,
    /// Ball is rolling
    Live,
    /// Run ended, showing final and best score
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Init => "INIT",
            GamePhase::Loading => "LOADING",
            GamePhase::Calibrate => "CALIBRATE",
            GamePhase::Countdown => "COUNTDOWN",
            GamePhase::Live => "LIVE",
            GamePhase::GameOver => "GAME_OVER",
        }
    }

    /// Whether the player's start action is accepted in this phase
    pub fn accepts_start(&self) -> bool {
        matches!(self, GamePhase::Init | GamePhase::GameOver)
    }

    /// Whether `self -> to` is an edge of the state machine
    pub fn can_transition_to(&self, to: GamePhase) -> bool {
        use GamePhase::*;
        matches!(
            (self, to),
            (Init, Loading)
                | (GameOver, Loading)
                | (Loading, Calibrate)
                | (Loading, Init)
                | (Calibrate, Countdown)
                | (Countdown, Live)
                | (Live, GameOver)
        )
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that can move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Player pressed Play / Play Again / Try Again
    Start,
    /// Detector attached, camera streaming, first video frame available
    SetupReady,
    /// Detector or camera setup failed
    SetupFailed,
    /// A continuous detection streak reached the calibration length
    CalibrationComplete,
    /// Countdown ran out
    CountdownElapsed,
    /// The ball fell off the stick
    BallDropped,
}

/// Side effects to run when entering a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Clear the roll estimator's baseline and calibration smoother
    ResetBaseline,
    /// Forget any partial calibration streak
    ClearCalibrationTimer,
    /// Unanchor the countdown so the next frame anchors it
    ClearCountdownTimer,
    /// Zero the ball and restart the run clock
    ResetRoller,
    /// Zero the displayed score
    ZeroScore,
    /// Compare the frozen score against the best and persist if beaten
    ConcludeRun,
}

/// A legal phase change and the effects it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: GamePhase,
    pub to: GamePhase,
    pub effects: Vec<Effect>,
}

/// Resolve an event against the current phase.
///
/// Returns `None` when the event has no edge out of `phase`.
pub fn transition(phase: GamePhase, event: PhaseEvent) -> Option<Transition> {
    use GamePhase::*;
    use PhaseEvent::*;

    let to = match (phase, event) {
        (Init | GameOver, Start) => Loading,
        (Loading, SetupReady) => Calibrate,
        (Loading, SetupFailed) => Init,
        (Calibrate, CalibrationComplete) => Countdown,
        (Countdown, CountdownElapsed) => Live,
        (Live, BallDropped) => GameOver,
        _ => return None,
    };

    Some(Transition {
        from: phase,
        to,
        effects: entry_effects(phase, to),
    })
}

fn entry_effects(from: GamePhase, to: GamePhase) -> Vec<Effect> {
    match to {
        GamePhase::Calibrate => vec![
            Effect::ResetBaseline,
            Effect::ClearCalibrationTimer,
            Effect::ResetRoller,
            Effect::ZeroScore,
        ],
        GamePhase::Countdown => vec![Effect::ClearCountdownTimer],
        GamePhase::Live => vec![Effect::ResetRoller, Effect::ZeroScore],
        GamePhase::GameOver if from == GamePhase::Live => vec![Effect::ConcludeRun],
        _ => Vec::new(),
    }
}

/// Things that happened during a frame, for the driver to act on
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// Run finished with this score
    RunEnded { score_ms: f64 },
    /// Score beat the stored best and should be persisted
    NewBest { best_ms: f64 },
}
