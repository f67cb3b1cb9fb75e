//! Per-frame game controller
//!
//! `tick` is called once per rendered frame with the latest landmarks (if any)
//! and the frame timestamp. It runs the roll estimator, advances the phase
//! machine, steps the ball while live, and returns a snapshot to draw.

use glam::Vec2;

use super::roller::Roller;
use super::state::{Effect, GameEvent, GamePhase, PhaseEvent, Transition, transition};
use super::tracker::{Detection, FrameSize, Landmark, RollEstimator};
use crate::consts::*;
use crate::error::SetupError;
use crate::highscores::BestScore;
use crate::platform::FrameClock;
use crate::settings::Tuning;
use crate::ui::{Hud, LoadingStage, Overlay, STATUS_CALIBRATING, STATUS_FIND_FACE};

/// Inputs for a single frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput<'a> {
    /// Landmarks of the detected face, `None` if no face this frame
    pub landmarks: Option<&'a [Landmark]>,
    /// Current video frame size in pixels
    pub frame: FrameSize,
}

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub phase: GamePhase,
    pub nose_px: Option<Vec2>,
    pub face_width_px: Option<f32>,
    pub roll: f32,
    pub roller: Roller,
    pub score_ms: f64,
    pub best_ms: f64,
    pub ball_skin: Option<String>,
    pub hud: Hud,
    /// Events raised since the previous snapshot
    pub events: Vec<GameEvent>,
}

/// Controller state, owned by the frame loop
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub estimator: RollEstimator,
    pub roller: Roller,
    pub tuning: Tuning,
    pub best: BestScore,
    pub hud: Hud,
    clock: FrameClock,
    /// A detector is attached and landmarks are accepted
    tracking: bool,
    calibrate_start_ms: Option<f64>,
    countdown_start_ms: Option<f64>,
    score_ms: f64,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(tuning: Tuning, best: BestScore) -> Self {
        let mut state = Self {
            phase: GamePhase::Init,
            estimator: RollEstimator::default(),
            roller: Roller::new(tuning.roller_constants()),
            tuning,
            best,
            hud: Hud::default(),
            clock: FrameClock::new(),
            tracking: false,
            calibrate_start_ms: None,
            countdown_start_ms: None,
            score_ms: 0.0,
            events: Vec::new(),
        };
        state.enter_phase();
        state
    }

    /// Player pressed Play. Returns true if setup should be kicked off.
    pub fn start(&mut self) -> bool {
        let now = self.clock.last_ms().unwrap_or(0.0);
        self.fire(PhaseEvent::Start, now)
    }

    /// Update the loading card while setup is in flight
    pub fn set_loading_stage(&mut self, stage: LoadingStage) {
        if self.phase == GamePhase::Loading {
            self.hud.show_overlay(Overlay::loading(stage));
        }
    }

    /// Detector and camera are up and the first video frame is available
    pub fn setup_ready(&mut self, now_ms: f64) -> bool {
        if self.phase != GamePhase::Loading {
            log::warn!("Setup finished outside LOADING ({}), ignoring", self.phase);
            return false;
        }
        self.tracking = true;
        self.fire(PhaseEvent::SetupReady, now_ms)
    }

    /// Setup failed; fall back to the title phase with the error shown
    pub fn setup_failed(&mut self, error: &SetupError, now_ms: f64) {
        log::warn!("Setup failed: {}", error);
        if self.fire(PhaseEvent::SetupFailed, now_ms) {
            self.hud.show_overlay(Overlay::setup_failed(error.user_message()));
        }
    }

    /// Page became visible again; avoid a huge `dt` on the next frame
    pub fn resync_clock(&mut self, now_ms: f64) {
        self.clock.resync(now_ms);
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Score shown on the HUD for the current phase
    pub fn display_score_ms(&self) -> f64 {
        match self.phase {
            GamePhase::Live | GamePhase::GameOver => self.score_ms,
            _ => 0.0,
        }
    }

    /// Events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run an event through the transition table. Returns true on a phase change.
    fn fire(&mut self, event: PhaseEvent, now_ms: f64) -> bool {
        match transition(self.phase, event) {
            Some(t) => {
                self.apply(t, now_ms);
                true
            }
            None => {
                log::debug!("Ignoring {:?} in {}", event, self.phase);
                false
            }
        }
    }

    fn apply(&mut self, t: Transition, now_ms: f64) {
        debug_assert_eq!(t.from, self.phase);
        debug_assert!(t.from.can_transition_to(t.to));
        log::info!("Phase {} -> {}", t.from, t.to);
        self.phase = t.to;

        for effect in &t.effects {
            match effect {
                Effect::ResetBaseline => self.estimator.reset_baseline(),
                Effect::ClearCalibrationTimer => self.calibrate_start_ms = None,
                Effect::ClearCountdownTimer => self.countdown_start_ms = None,
                Effect::ResetRoller => self.roller.reset(now_ms),
                Effect::ZeroScore => self.score_ms = 0.0,
                Effect::ConcludeRun => self.conclude_run(now_ms),
            }
        }

        self.events.push(GameEvent::PhaseChanged {
            from: t.from,
            to: t.to,
        });
        self.enter_phase();
    }

    fn conclude_run(&mut self, now_ms: f64) {
        self.score_ms = self.roller.score_ms(now_ms);
        self.events.push(GameEvent::RunEnded {
            score_ms: self.score_ms,
        });
        if self.best.submit(self.score_ms) {
            log::info!("New best: {:.0}ms", self.score_ms);
            self.events.push(GameEvent::NewBest {
                best_ms: self.score_ms,
            });
        }
    }

    /// Overlay and status for the phase just entered
    fn enter_phase(&mut self) {
        match self.phase {
            GamePhase::Init => {
                self.hud.show_overlay(Overlay::title_screen());
                self.hud.hide_status();
            }
            GamePhase::Loading => {
                self.hud.show_overlay(Overlay::loading(LoadingStage::Detector));
                self.hud.hide_status();
            }
            GamePhase::Calibrate => {
                self.hud.hide_overlay();
                self.hud.show_status(STATUS_CALIBRATING);
            }
            GamePhase::Countdown => {
                let seconds = (COUNTDOWN_MS / 1000.0).ceil() as u32;
                self.hud.show_overlay(Overlay::countdown(seconds));
                self.hud.hide_status();
            }
            GamePhase::Live => {
                self.hud.hide_overlay();
                self.hud.hide_status();
            }
            GamePhase::GameOver => {
                self.hud.show_overlay(Overlay::game_over(self.score_ms));
                self.hud.hide_status();
            }
        }
    }

    /// Timer-driven phase progression
    fn progress(&mut self, now_ms: f64, detection: Option<&Detection>) {
        if self.phase == GamePhase::Calibrate {
            match detection {
                Some(_) => {
                    let start = *self.calibrate_start_ms.get_or_insert(now_ms);
                    self.hud.show_status(STATUS_CALIBRATING);
                    if now_ms - start >= CALIBRATION_MS {
                        self.calibrate_start_ms = None;
                        self.fire(PhaseEvent::CalibrationComplete, now_ms);
                    }
                }
                None => {
                    // No partial credit across interruptions
                    self.calibrate_start_ms = None;
                    self.hud.show_status(STATUS_FIND_FACE);
                }
            }
        }

        if self.phase == GamePhase::Countdown {
            let start = *self.countdown_start_ms.get_or_insert(now_ms);
            let remaining = (COUNTDOWN_MS - (now_ms - start)).max(0.0);
            let seconds_left = (remaining / 1000.0).ceil() as u32;
            self.hud.show_overlay(Overlay::countdown(seconds_left));
            if remaining <= 0.0 {
                self.countdown_start_ms = None;
                self.fire(PhaseEvent::CountdownElapsed, now_ms);
            }
        }

        if self.phase == GamePhase::Live {
            if detection.is_some() {
                self.hud.hide_status();
            } else {
                self.hud.show_status(STATUS_FIND_FACE);
            }
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Tuning::default(), BestScore::default())
    }
}

/// Advance the game by one rendered frame
pub fn tick(state: &mut GameState, input: &TickInput, now_ms: f64) -> FrameSnapshot {
    let dt = state.clock.advance(now_ms);

    let detection = match input.landmarks {
        Some(landmarks) if state.tracking => {
            state.estimator.update(landmarks, state.phase, input.frame)
        }
        _ => None,
    };

    state.progress(now_ms, detection.as_ref());

    if let Some(det) = &detection {
        state.roller.configure(
            det.face_width_px * state.tuning.k_l,
            det.face_width_px * state.tuning.k_r,
        );

        if state.phase == GamePhase::Live {
            state.roller.step(dt, det.roll, now_ms);
            state.score_ms = state.roller.score_ms(now_ms);
        }
    }

    if state.phase == GamePhase::Live && state.roller.over {
        state.fire(PhaseEvent::BallDropped, now_ms);
    }

    FrameSnapshot {
        phase: state.phase,
        nose_px: detection.map(|d| d.nose_px),
        face_width_px: detection.map(|d| d.face_width_px),
        roll: detection.map(|d| d.roll).unwrap_or(0.0),
        roller: state.roller.clone(),
        score_ms: state.display_score_ms(),
        best_ms: state.best.best_ms,
        ball_skin: state.tuning.ball_skin.clone(),
        hud: state.hud.clone(),
        events: state.drain_events(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tracker::face;

    const FRAME_MS: f64 = 20.0;

    fn level_face() -> Vec<Landmark> {
        face((0.4, 0.5), (0.6, 0.5), (0.5, 0.55))
    }

    /// Raw roll of `roll` radians around a level nose
    fn tilted_face(roll: f32) -> Vec<Landmark> {
        let dy = roll.tan() * 0.1;
        face((0.4, 0.5 - dy), (0.6, 0.5 + dy), (0.5, 0.55))
    }

    fn frame(state: &mut GameState, landmarks: Option<&[Landmark]>, now: f64) -> FrameSnapshot {
        let input = TickInput {
            landmarks,
            frame: FrameSize::new(640.0, 480.0),
        };
        tick(state, &input, now)
    }

    /// Start a game and finish setup at `now`
    fn calibrating(now: f64) -> GameState {
        let mut state = GameState::default();
        assert!(state.start());
        assert!(state.setup_ready(now));
        assert_eq!(state.phase, GamePhase::Calibrate);
        state
    }

    fn phase_changes(events: &[GameEvent]) -> Vec<GamePhase> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::PhaseChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let state = GameState::default();
        assert_eq!(state.phase, GamePhase::Init);
        assert_eq!(state.hud.overlay, Some(Overlay::title_screen()));
        assert!(!state.is_tracking());
    }

    #[test]
    fn test_landmarks_ignored_before_setup() {
        let mut state = GameState::default();
        let landmarks = level_face();
        let snap = frame(&mut state, Some(&landmarks), 0.0);
        assert_eq!(snap.phase, GamePhase::Init);
        assert!(snap.nose_px.is_none());
    }

    #[test]
    fn test_loading_waits_for_setup() {
        let mut state = GameState::default();
        assert!(state.start());
        assert!(!state.start());
        for i in 0..500 {
            frame(&mut state, None, i as f64 * FRAME_MS);
        }
        assert_eq!(state.phase, GamePhase::Loading);

        state.set_loading_stage(LoadingStage::Camera);
        assert_eq!(
            state.hud.overlay.as_ref().map(|o| o.body.as_str()),
            Some("Connecting to your camera…")
        );
    }

    #[test]
    fn test_setup_failure_falls_back_to_init() {
        let mut state = GameState::default();
        state.start();
        state.setup_failed(&SetupError::CameraDenied, 0.0);
        assert_eq!(state.phase, GamePhase::Init);
        let overlay = state.hud.overlay.clone().unwrap();
        assert_eq!(overlay.title, "Camera Needed");
        assert_eq!(overlay.action.as_deref(), Some("Try Again"));
        assert!(!state.is_tracking());

        // Retry is allowed
        assert!(state.start());
    }

    #[test]
    fn test_illegal_requests_ignored() {
        let mut state = GameState::default();
        assert!(!state.setup_ready(0.0));
        assert_eq!(state.phase, GamePhase::Init);

        let mut state = calibrating(0.0);
        assert!(!state.start());
        state.setup_failed(&SetupError::CameraNotFound, 0.0);
        assert_eq!(state.phase, GamePhase::Calibrate);
    }

    #[test]
    fn test_calibration_needs_one_second() {
        let mut state = calibrating(0.0);
        let landmarks = level_face();
        let mut transitions = Vec::new();

        for i in 0..=50 {
            let now = i as f64 * FRAME_MS;
            let snap = frame(&mut state, Some(&landmarks), now);
            transitions.extend(phase_changes(&snap.events));
            if i < 50 {
                assert_eq!(snap.phase, GamePhase::Calibrate, "at {now}ms");
                assert_eq!(snap.hud.status.as_deref(), Some(STATUS_CALIBRATING));
            }
        }

        assert_eq!(state.phase, GamePhase::Countdown);
        // Start and setup transitions surface in the first snapshot
        assert_eq!(
            transitions,
            vec![GamePhase::Loading, GamePhase::Calibrate, GamePhase::Countdown]
        );
        assert!(state.estimator.has_baseline());
    }

    #[test]
    fn test_missed_frame_resets_calibration() {
        let mut state = calibrating(0.0);
        let landmarks = level_face();

        for i in 0..50 {
            frame(&mut state, Some(&landmarks), i as f64 * FRAME_MS);
        }
        let snap = frame(&mut state, None, 999.0);
        assert_eq!(snap.phase, GamePhase::Calibrate);
        assert_eq!(snap.hud.status.as_deref(), Some(STATUS_FIND_FACE));

        // Streak restarts at 1000ms, so 1980ms is still short
        let mut now = 1000.0;
        while now < 2000.0 {
            let snap = frame(&mut state, Some(&landmarks), now);
            assert_eq!(snap.phase, GamePhase::Calibrate, "at {now}ms");
            now += FRAME_MS;
        }
        frame(&mut state, Some(&landmarks), 2000.0);
        assert_eq!(state.phase, GamePhase::Countdown);
    }

    #[test]
    fn test_countdown_runs_without_detection() {
        let mut state = calibrating(0.0);
        let landmarks = level_face();
        for i in 0..=50 {
            frame(&mut state, Some(&landmarks), i as f64 * FRAME_MS);
        }
        assert_eq!(state.phase, GamePhase::Countdown);

        // Anchored at the calibration-complete frame (1000ms)
        let snap = frame(&mut state, None, 1020.0);
        assert_eq!(snap.hud.overlay.as_ref().unwrap().body, "3");
        let snap = frame(&mut state, None, 2500.0);
        assert_eq!(snap.hud.overlay.as_ref().unwrap().body, "2");
        let snap = frame(&mut state, None, 3980.0);
        assert_eq!(snap.phase, GamePhase::Countdown);
        assert_eq!(snap.hud.overlay.as_ref().unwrap().body, "1");

        let snap = frame(&mut state, None, 4000.0);
        assert_eq!(snap.phase, GamePhase::Live);
        assert_eq!(phase_changes(&snap.events), vec![GamePhase::Live]);
        assert!(snap.hud.overlay.is_none());

        let snap = frame(&mut state, None, 4020.0);
        assert!(snap.events.is_empty());
    }

    #[test]
    fn test_live_without_detection_holds_ball() {
        let mut state = calibrating(0.0);
        let landmarks = level_face();
        for i in 0..=50 {
            frame(&mut state, Some(&landmarks), i as f64 * FRAME_MS);
        }
        frame(&mut state, None, 4000.0);
        assert_eq!(state.phase, GamePhase::Live);

        state.roller.v = 30.0;
        let snap = frame(&mut state, None, 4020.0);
        assert_eq!(snap.roller.x, 0.0);
        assert_eq!(snap.hud.status.as_deref(), Some(STATUS_FIND_FACE));

        let snap = frame(&mut state, Some(&landmarks), 4040.0);
        assert!(snap.roller.x > 0.0);
        assert!(snap.hud.status.is_none());
    }

    #[test]
    fn test_end_to_end_run() {
        let mut state = GameState::default();
        assert_eq!(state.phase, GamePhase::Init);
        assert!(state.start());
        assert_eq!(state.phase, GamePhase::Loading);
        assert!(state.setup_ready(0.0));

        // Calibrate on a level head
        let level = level_face();
        let mut now = 0.0;
        while state.phase == GamePhase::Calibrate {
            frame(&mut state, Some(&level), now);
            now += FRAME_MS;
        }
        assert_eq!(state.phase, GamePhase::Countdown);

        // Countdown with nobody in frame
        let mut live_start = None;
        while state.phase == GamePhase::Countdown {
            let snap = frame(&mut state, None, now);
            if snap.phase == GamePhase::Live {
                live_start = Some(now);
            }
            now += FRAME_MS;
        }
        let live_start = live_start.unwrap();
        assert_eq!(live_start, 4000.0);

        // Hold a steady 0.3 rad tilt until the ball drops
        let tilted = tilted_face(0.3);
        let mut events = Vec::new();
        let mut last = None;
        for _ in 0..2000 {
            let snap = frame(&mut state, Some(&tilted), now);
            events.extend(snap.events.clone());
            let done = snap.phase == GamePhase::GameOver;
            last = Some((snap, now));
            if done {
                break;
            }
            now += FRAME_MS;
        }

        let (snap, over_at) = last.unwrap();
        assert_eq!(snap.phase, GamePhase::GameOver);
        assert!(snap.roller.over);
        assert!(snap.roller.x.abs() > snap.roller.limit());
        assert!((snap.roll - 0.3).abs() < 1e-3);

        let elapsed = over_at - live_start;
        assert!((snap.score_ms - elapsed).abs() <= FRAME_MS);
        assert_eq!(snap.best_ms, snap.score_ms);
        assert!(events.contains(&GameEvent::RunEnded {
            score_ms: snap.score_ms
        }));
        assert!(events.contains(&GameEvent::NewBest {
            best_ms: snap.score_ms
        }));

        let overlay = snap.hud.overlay.unwrap();
        assert_eq!(overlay.title, "Game Over");
        assert_eq!(overlay.action.as_deref(), Some("Play Again"));

        // Score stays frozen on the game over screen
        let later = frame(&mut state, Some(&tilted), now + 5000.0);
        assert_eq!(later.score_ms, snap.score_ms);
        assert_eq!(later.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_roller_frozen_until_live() {
        let mut state = calibrating(0.0);
        let calibrate_tilt = tilted_face(0.4);
        let countdown_tilt = tilted_face(-0.4);
        let mut now = 0.0;
        let mut max_roll: f32 = 0.0;

        for _ in 0..1000 {
            let landmarks: &[Landmark] = if state.phase == GamePhase::Calibrate {
                &calibrate_tilt
            } else {
                &countdown_tilt
            };
            let snap = frame(&mut state, Some(landmarks), now);
            now += FRAME_MS;
            if snap.phase == GamePhase::Live {
                break;
            }
            assert!(
                snap.roller.x == 0.0 && snap.roller.v == 0.0,
                "ball moved in {} at {now}ms",
                snap.phase
            );
            if snap.phase == GamePhase::Countdown {
                max_roll = max_roll.max(snap.roll.abs());
            }
        }

        assert_eq!(state.phase, GamePhase::Live);
        // The countdown frames carried a real tilt
        assert!(max_roll > 0.5);
    }

    /// Calibrate on `level`, then sit out the countdown. Returns the next frame time.
    fn play_to_live(state: &mut GameState, level: &[Landmark], mut now: f64) -> f64 {
        while state.phase == GamePhase::Calibrate {
            frame(state, Some(level), now);
            now += FRAME_MS;
        }
        while state.phase == GamePhase::Countdown {
            frame(state, None, now);
            now += FRAME_MS;
        }
        assert_eq!(state.phase, GamePhase::Live);
        now
    }

    /// Hold `tilted` until the ball drops, collecting every event on the way
    fn play_until_drop(
        state: &mut GameState,
        tilted: &[Landmark],
        mut now: f64,
    ) -> (FrameSnapshot, Vec<GameEvent>, f64) {
        let mut events = Vec::new();
        for _ in 0..2000 {
            let snap = frame(state, Some(tilted), now);
            events.extend(snap.events.clone());
            if snap.phase == GamePhase::GameOver {
                return (snap, events, now);
            }
            now += FRAME_MS;
        }
        panic!("ball never dropped");
    }

    #[test]
    fn test_best_only_on_strict_improvement() {
        let mut state = GameState::new(Tuning::default(), BestScore::new(f64::MAX));
        state.start();
        state.setup_ready(0.0);

        let now = play_to_live(&mut state, &level_face(), 0.0);
        let (snap, events, _) = play_until_drop(&mut state, &tilted_face(0.3), now);

        assert!(snap.score_ms > 0.0);
        assert!(events.contains(&GameEvent::RunEnded {
            score_ms: snap.score_ms
        }));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::NewBest { .. })));
        assert_eq!(snap.best_ms, f64::MAX);
    }

    #[test]
    fn test_restart_recalibrates() {
        let mut state = calibrating(0.0);
        let now = play_to_live(&mut state, &tilted_face(0.2), 0.0);
        let (first, _, over_at) = play_until_drop(&mut state, &tilted_face(0.6), now);
        assert!(state.estimator.has_baseline());
        assert!(first.score_ms > 0.0);

        assert!(state.start());
        assert_eq!(state.phase, GamePhase::Loading);
        assert!(state.setup_ready(over_at + 100.0));
        assert_eq!(state.phase, GamePhase::Calibrate);
        assert!(!state.estimator.has_baseline());
        assert_eq!(state.estimator.roll(), 0.0);
        assert_eq!(state.roller.x, 0.0);
        assert_eq!(state.roller.v, 0.0);
        assert_eq!(state.display_score_ms(), 0.0);
    }

    #[test]
    fn test_resync_avoids_large_step() {
        let mut state = GameState::default();
        frame(&mut state, None, 0.0);
        state.resync_clock(60_000.0);
        assert_eq!(state.clock.advance(60_000.0), 0.0);
    }
}
