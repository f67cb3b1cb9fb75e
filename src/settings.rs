//! Tuning parameters
//!
//! Read once from the page's query string (`?L=1.8&R=0.1&hard=1&ball=🍊`).

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::RollerConstants;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Stick length per pixel of face width
    pub k_l: f32,
    /// Ball radius per pixel of face width
    pub k_r: f32,
    /// Stronger gravity, less friction
    pub hard: bool,
    /// Cosmetic glyph drawn on the ball
    pub ball_skin: Option<String>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            k_l: DEFAULT_K_L,
            k_r: DEFAULT_K_R,
            hard: false,
            ball_skin: None,
        }
    }
}

impl Tuning {
    /// Build from a query parameter lookup.
    ///
    /// Unparseable numbers keep their defaults; `hard` is on for any value
    /// except `"0"`.
    pub fn from_params<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut tuning = Self::default();

        if let Some(k_l) = get("L").and_then(|v| parse_number(&v)) {
            tuning.k_l = k_l;
        }
        if let Some(k_r) = get("R").and_then(|v| parse_number(&v)) {
            tuning.k_r = k_r;
        }
        if let Some(hard) = get("hard") {
            tuning.hard = hard != "0";
        }
        if let Some(ball) = get("ball").filter(|v| !v.is_empty()) {
            tuning.ball_skin = Some(ball);
        }

        tuning
    }

    /// Gravity/friction preset for the selected difficulty
    pub fn roller_constants(&self) -> RollerConstants {
        if self.hard {
            RollerConstants::hard()
        } else {
            RollerConstants::normal()
        }
    }

    /// Read tuning from `window.location.search` (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let search = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();

        match web_sys::UrlSearchParams::new_with_str(&search) {
            Ok(params) => {
                let tuning = Self::from_params(|key| params.get(key));
                log::info!("Tuning: {:?}", tuning);
                tuning
            }
            Err(_) => Self::default(),
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

/// Longest leading decimal number, like `parseFloat` ("1.5x" -> 1.5,
/// "1.5.2" -> 1.5, "1e2" -> 100)
fn parse_number(value: &str) -> Option<f32> {
    let bytes = value.trim_start().as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }
    if !has_digits {
        return None;
    }

    // Exponent only counts when at least one digit follows
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }

    std::str::from_utf8(&bytes[..end])
        .ok()?
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
}
