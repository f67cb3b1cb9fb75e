//! Ball rolling on a tiltable stick
//!
//! Semi-implicit Euler with multiplicative damping. Time is passed in
//! explicitly so the run clock is deterministic under test.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Gravity and friction for one difficulty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollerConstants {
    /// Gravity-like acceleration along the stick (px/s²)
    pub g: f32,
    /// Velocity multiplier applied every step
    pub mu: f32,
}

impl Default for RollerConstants {
    fn default() -> Self {
        Self {
            g: DEFAULT_GRAVITY,
            mu: DEFAULT_FRICTION,
        }
    }
}

impl RollerConstants {
    pub fn normal() -> Self {
        Self {
            g: NORMAL_GRAVITY,
            mu: NORMAL_FRICTION,
        }
    }

    pub fn hard() -> Self {
        Self {
            g: HARD_GRAVITY,
            mu: HARD_FRICTION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roller {
    pub constants: RollerConstants,
    /// Ball position along the stick, 0 = centre (px)
    pub x: f32,
    /// Ball velocity (px/s)
    pub v: f32,
    /// Stick length (px)
    pub length: f32,
    /// Ball radius (px)
    pub radius: f32,
    /// Ball has fallen off; terminal until `reset`
    pub over: bool,
    run_start_ms: f64,
    frozen_score_ms: Option<f64>,
}

impl Roller {
    pub fn new(constants: RollerConstants) -> Self {
        Self {
            constants,
            x: 0.0,
            v: 0.0,
            length: 0.0,
            radius: 0.0,
            over: false,
            run_start_ms: 0.0,
            frozen_score_ms: None,
        }
    }

    /// Resize the playfield (called every frame from the face width)
    pub fn configure(&mut self, length: f32, radius: f32) {
        self.length = length;
        self.radius = radius;
    }

    /// Start a fresh run at `now_ms`
    pub fn reset(&mut self, now_ms: f64) {
        self.x = 0.0;
        self.v = 0.0;
        self.over = false;
        self.run_start_ms = now_ms;
        self.frozen_score_ms = None;
    }

    /// Furthest the ball can sit from centre before it falls
    pub fn limit(&self) -> f32 {
        self.length / 2.0 + self.radius * OVERHANG_FACTOR
    }

    /// Advance by `dt` seconds with the stick tilted by `tilt` radians.
    ///
    /// `dt` is not clamped here. No-op once the ball has fallen.
    pub fn step(&mut self, dt: f32, tilt: f32, now_ms: f64) {
        if self.over {
            return;
        }

        let RollerConstants { g, mu } = self.constants;
        let a = -g * tilt.sin();
        self.v = (self.v + a * dt) * mu;
        self.x += self.v * dt;

        if self.x.abs() > self.limit() {
            self.over = true;
            let score = now_ms - self.run_start_ms;
            self.frozen_score_ms = Some(score);
            log::debug!("Ball dropped at x={:.1} after {:.0}ms", self.x, score);
        }
    }

    /// Elapsed run time; frozen once the ball has fallen
    pub fn score_ms(&self, now_ms: f64) -> f64 {
        match self.frozen_score_ms {
            Some(score) => score,
            None => now_ms - self.run_start_ms,
        }
    }
}

impl Default for Roller {
    fn default() -> Self {
        Self::new(RollerConstants::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn test_roller() -> Roller {
        let mut roller = Roller::new(RollerConstants { g: 160.0, mu: 0.997 });
        roller.configure(200.0, 20.0);
        roller.reset(0.0);
        roller
    }

    #[test]
    fn test_limit() {
        let roller = test_roller();
        assert_eq!(roller.limit(), 110.0);
    }

    #[test]
    fn test_zero_tilt_stays_put() {
        let mut roller = test_roller();
        for i in 0..10_000 {
            roller.step(DT, 0.0, i as f64 * FRAME_MS);
        }
        assert_eq!(roller.x, 0.0);
        assert_eq!(roller.v, 0.0);
        assert!(!roller.over);
    }

    #[test]
    fn test_tilt_diverges_and_freezes_score() {
        for tilt in [0.3f32, -0.3] {
            let mut roller = test_roller();
            let mut now = 0.0;
            let mut last_x = 0.0f32;
            let mut trip_time = None;

            for _ in 0..1000 {
                now += FRAME_MS;
                roller.step(DT, tilt, now);
                if roller.over {
                    trip_time = Some(now);
                    break;
                }
                // Positive tilt accelerates toward negative x
                assert!(roller.x * tilt.signum() < last_x * tilt.signum());
                last_x = roller.x;
            }

            let trip_time = trip_time.expect("ball should fall off");
            assert!(roller.x.abs() > roller.limit());
            assert_eq!(roller.score_ms(trip_time + 5000.0), trip_time);

            // Further steps are no-ops
            let x = roller.x;
            roller.step(DT, tilt, trip_time + 100.0);
            assert_eq!(roller.x, x);
            assert!(roller.over);
            assert_eq!(roller.score_ms(trip_time + 100.0), trip_time);
        }
    }

    #[test]
    fn test_score_is_live_until_over() {
        let mut roller = test_roller();
        roller.reset(1_000.0);
        assert_eq!(roller.score_ms(1_500.0), 500.0);
        assert_eq!(roller.score_ms(2_750.0), 1_750.0);
    }

    #[test]
    fn test_reset_clears_run() {
        let mut roller = test_roller();
        roller.x = 500.0;
        roller.step(DT, 0.0, 16.0);
        assert!(roller.over);

        roller.reset(2_000.0);
        assert!(!roller.over);
        assert_eq!(roller.x, 0.0);
        assert_eq!(roller.v, 0.0);
        assert_eq!(roller.score_ms(2_250.0), 250.0);
    }

    #[test]
    fn test_presets() {
        assert_eq!(RollerConstants::default().g, 160.0);
        assert_eq!(RollerConstants::normal().mu, 0.995);
        assert_eq!(RollerConstants::hard().g, 220.0);
    }

    proptest! {
        #[test]
        fn prop_zero_tilt_any_dt(dts in prop::collection::vec(0.0f32..0.1, 1..200)) {
            let mut roller = test_roller();
            let mut now = 0.0;
            for dt in dts {
                now += dt as f64 * 1000.0;
                roller.step(dt, 0.0, now);
            }
            prop_assert_eq!(roller.x, 0.0);
            prop_assert_eq!(roller.v, 0.0);
            prop_assert!(!roller.over);
        }
    }
}
