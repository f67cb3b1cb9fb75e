//! Best score tracking
//!
//! One value, persisted through a [`BestScoreStore`]. A run replaces it only
//! when strictly longer.

use serde::{Deserialize, Serialize};

use crate::persistence::BestScoreStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BestScore {
    pub best_ms: f64,
}

impl BestScore {
    pub fn new(best_ms: f64) -> Self {
        Self { best_ms }
    }

    /// Check if a run would set a new record
    pub fn qualifies(&self, score_ms: f64) -> bool {
        score_ms > self.best_ms
    }

    /// Record a finished run. Returns true if it became the new best.
    pub fn submit(&mut self, score_ms: f64) -> bool {
        if !self.qualifies(score_ms) {
            return false;
        }
        self.best_ms = score_ms;
        true
    }

    pub fn load(store: &dyn BestScoreStore) -> Self {
        let best = Self::new(store.read_best());
        log::info!("Loaded best score: {:.0}ms", best.best_ms);
        best
    }

    pub fn save(&self, store: &mut dyn BestScoreStore) {
        store.write_best(self.best_ms);
    }
}
