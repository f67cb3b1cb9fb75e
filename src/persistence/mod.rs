//! Best score storage
//!
//! The browser build keeps a single number in LocalStorage. Reads fall back to
//! 0 on anything missing or malformed; writes are best-effort.

/// LocalStorage key for the best run (milliseconds)
pub const BEST_KEY: &str = "nose-balance-best-ms";

pub trait BestScoreStore {
    /// Stored best in milliseconds, 0 if absent
    fn read_best(&self) -> f64;
    fn write_best(&mut self, best_ms: f64);
}

/// Decode a stored value, rejecting anything non-finite or negative
pub fn decode_best(raw: &str) -> f64 {
    serde_json::from_str::<f64>(raw.trim())
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

pub fn encode_best(best_ms: f64) -> String {
    serde_json::to_string(&best_ms).unwrap_or_else(|_| "0".to_string())
}

/// In-process store for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: Option<String>,
    pub writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: &str) -> Self {
        Self {
            raw: Some(raw.to_string()),
            writes: 0,
        }
    }
}

impl BestScoreStore for MemoryStore {
    fn read_best(&self) -> f64 {
        self.raw.as_deref().map(decode_best).unwrap_or(0.0)
    }

    fn write_best(&mut self, best_ms: f64) {
        self.raw = Some(encode_best(best_ms));
        self.writes += 1;
    }
}

/// `window.localStorage` backed store (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl BestScoreStore for LocalStorageStore {
    fn read_best(&self) -> f64 {
        Self::storage()
            .and_then(|s| s.get_item(BEST_KEY).ok().flatten())
            .map(|raw| decode_best(&raw))
            .unwrap_or(0.0)
    }

    fn write_best(&mut self, best_ms: f64) {
        if let Some(storage) = Self::storage() {
            let _ = storage.set_item(BEST_KEY, &encode_best(best_ms));
            log::info!("Best score saved ({:.0}ms)", best_ms);
        }
    }
}
